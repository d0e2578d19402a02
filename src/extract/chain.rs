//! 首个成功即返回的策略链
//!
//! 每个策略相互独立，输入同一份数据，返回可选结果；按注册顺序依次尝试，
//! 第一个返回 `Some` 的策略胜出，后续策略不再执行，结果之间不做混合。

type Strategy<I, O> = Box<dyn Fn(&I) -> Option<O> + Send + Sync>;

/// 具名策略的有序列表。
pub struct StrategyChain<I: ?Sized, O> {
    strategies: Vec<(&'static str, Strategy<I, O>)>,
}

impl<I: ?Sized, O> Default for StrategyChain<I, O> {
    fn default() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }
}

impl<I: ?Sized, O> StrategyChain<I, O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在链尾追加一个策略。
    pub fn then<F>(mut self, name: &'static str, strategy: F) -> Self
    where
        F: Fn(&I) -> Option<O> + Send + Sync + 'static,
    {
        self.strategies.push((name, Box::new(strategy)));
        self
    }

    /// 依次尝试，返回首个成功的策略名与结果。
    pub fn run_named(&self, input: &I) -> Option<(&'static str, O)> {
        self.strategies
            .iter()
            .find_map(|(name, strategy)| strategy(input).map(|output| (*name, output)))
    }

    pub fn run(&self, input: &I) -> Option<O> {
        self.run_named(input).map(|(_, output)| output)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
