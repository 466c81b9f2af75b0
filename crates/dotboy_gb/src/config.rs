use std::path::PathBuf;

use typed_builder::TypedBuilder;

/// Machine-level settings.
///
/// ```
/// use dotboy_gb::GameBoyConfig;
///
/// let config = GameBoyConfig::builder().save_dir("saves").build();
/// assert!(config.persist_saves);
/// ```
#[derive(Clone, Debug, TypedBuilder)]
pub struct GameBoyConfig {
    /// Directory receiving `<title>.sav` battery saves.
    #[builder(default = PathBuf::from("."), setter(into))]
    pub save_dir: PathBuf,
    /// When false, battery RAM lives only in memory.
    #[builder(default = true)]
    pub persist_saves: bool,
}

impl Default for GameBoyConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
