//! Shared runtime context built after CLI parsing, holding the resolved
//! config/profile/history locations the rest of the command handlers use.

use deploy_core::{GlobalConfig, HistoryJournal, ProfileResolver};

/// Holds shared state built during startup so command handlers can use
/// `ctx.profiles`, `ctx.history`, etc. instead of re-deriving them.
pub(crate) struct RunContext {
    pub(crate) config: GlobalConfig,
    pub(crate) profiles: ProfileResolver,
    pub(crate) history: HistoryJournal,
    pub(crate) no_color: bool,
    pub(crate) quiet: bool,
}

impl RunContext {
    pub(crate) fn build(no_color: bool, quiet: bool) -> anyhow::Result<Self> {
        let config = GlobalConfig::load_default()?;
        let profiles = ProfileResolver::default_location()?;
        let history = HistoryJournal::default_location()?;
        Ok(Self {
            config,
            profiles,
            history,
            no_color,
            quiet,
        })
    }
}
