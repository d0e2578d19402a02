//! 前台应用查询
//!
//! 仅用于给历史条目标注来源。查询失败时两个字段都为 `None`，不影响捕获。
//!
//! - Windows：前台窗口所属进程的可执行文件，`name` 为文件名（不含扩展名），
//!   `bundle_id` 为完整路径。
//! - 其他平台：暂不查询，始终返回空来源。

use super::{AppIdentity, AppIdentityProvider};

/// 不做任何查询的来源提供者。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAppIdentity;

impl AppIdentityProvider for NoAppIdentity {
    fn current_foreground_app(&self) -> AppIdentity {
        AppIdentity::default()
    }
}

/// 系统前台应用查询。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAppIdentity;

impl SystemAppIdentity {
    pub fn new() -> Self {
        Self
    }
}

impl AppIdentityProvider for SystemAppIdentity {
    #[cfg(target_os = "windows")]
    fn current_foreground_app(&self) -> AppIdentity {
        match win32::foreground_executable() {
            Some(path) => identity_from_executable_path(&path),
            None => AppIdentity::default(),
        }
    }

    #[cfg(not(target_os = "windows"))]
    fn current_foreground_app(&self) -> AppIdentity {
        AppIdentity::default()
    }
}

#[cfg_attr(not(any(target_os = "windows", test)), allow(dead_code))]
fn identity_from_executable_path(path: &str) -> AppIdentity {
    let name = std::path::Path::new(path)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string);
    AppIdentity {
        name,
        bundle_id: Some(path.to_string()).filter(|p| !p.is_empty()),
    }
}

#[cfg(target_os = "windows")]
mod win32 {
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;

    use windows::Win32::Foundation::CloseHandle;
    use windows::Win32::System::Threading::{
        OpenProcess, PROCESS_NAME_WIN32, PROCESS_QUERY_LIMITED_INFORMATION,
        QueryFullProcessImageNameW,
    };
    use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowThreadProcessId};
    use windows::core::PWSTR;

    pub(super) fn foreground_executable() -> Option<String> {
        unsafe {
            let hwnd = GetForegroundWindow();
            if hwnd.0.is_null() {
                return None;
            }

            let mut pid = 0_u32;
            GetWindowThreadProcessId(hwnd, Some(&mut pid as *mut u32));
            if pid == 0 {
                return None;
            }

            let process = match OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid) {
                Ok(handle) => handle,
                Err(err) => {
                    log::debug!("打开前台进程失败 (pid={}): {}", pid, err);
                    return None;
                }
            };

            let mut buf = vec![0_u16; 1024];
            let mut len = buf.len() as u32;
            let result = QueryFullProcessImageNameW(
                process,
                PROCESS_NAME_WIN32,
                PWSTR(buf.as_mut_ptr()),
                &mut len,
            );
            let _ = CloseHandle(process);

            if let Err(err) = result {
                log::debug!("查询前台进程路径失败 (pid={}): {}", pid, err);
                return None;
            }

            buf.truncate(len as usize);
            Some(OsString::from_wide(&buf).to_string_lossy().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_identity_returns_empty_fields() {
        assert_eq!(NoAppIdentity.current_foreground_app(), AppIdentity::default());
    }

    #[test]
    fn identity_uses_file_stem_and_full_path() {
        let identity = identity_from_executable_path("C:/Program Files/Editor/editor.exe");
        assert_eq!(identity.name.as_deref(), Some("editor"));
        assert_eq!(
            identity.bundle_id.as_deref(),
            Some("C:/Program Files/Editor/editor.exe")
        );
    }

    #[test]
    fn empty_path_yields_no_identity() {
        assert_eq!(identity_from_executable_path(""), AppIdentity::default());
    }
}
