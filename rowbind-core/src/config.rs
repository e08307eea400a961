use std::borrow::Cow;

pub const DEFAULT_TAG_NAME: &str = "orm";
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Settings consumed by every mapper operation.
///
/// A mapper holds one base configuration, each call may adjust a copy of it through
/// [`Opt`] overrides. There is no process wide mutable default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Tag key whose values name the columns.
    pub tag_name: Cow<'static, str>,
    /// Guard updates with the `version` field.
    pub enable_optimistic_lock: bool,
    /// Expand list arguments into placeholder groups before executing.
    pub rewrite_query: bool,
    /// Maximum rows per statement in batched inserts.
    pub batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tag_name: Cow::Borrowed(DEFAULT_TAG_NAME),
            enable_optimistic_lock: false,
            rewrite_query: true,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_name(mut self, tag_name: impl Into<Cow<'static, str>>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn optimistic_lock(mut self, enable: bool) -> Self {
        self.enable_optimistic_lock = enable;
        self
    }

    pub fn rewrite_query(mut self, enable: bool) -> Self {
        self.rewrite_query = enable;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// A copy with `opts` applied in order, later ones win.
    pub fn with(&self, opts: &[Opt]) -> Config {
        opts.iter().fold(self.clone(), |config, opt| opt.apply(config))
    }
}

/// Per call override of one [`Config`] setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Opt {
    TagName(Cow<'static, str>),
    OptimisticLock(bool),
    RewriteQuery(bool),
    BatchSize(usize),
}

impl Opt {
    pub fn tag_name(tag_name: impl Into<Cow<'static, str>>) -> Self {
        Opt::TagName(tag_name.into())
    }

    pub fn apply(&self, config: Config) -> Config {
        match self {
            Opt::TagName(v) => config.tag_name(v.clone()),
            Opt::OptimisticLock(v) => config.optimistic_lock(*v),
            Opt::RewriteQuery(v) => config.rewrite_query(*v),
            Opt::BatchSize(v) => config.batch_size(*v),
        }
    }
}
