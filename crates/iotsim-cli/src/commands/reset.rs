//! Reset command - forget the saved selection

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use iotsim_session::{FileStore, PreferencesAdapter};

use crate::output::OutputContext;

/// Remove the saved preferences record
pub fn reset(preferences_path: &Path, ctx: &OutputContext) -> Result<()> {
    let store = Arc::new(FileStore::new(preferences_path));
    let adapter = PreferencesAdapter::new(store.clone());
    if let Some(prefs) = adapter.load() {
        ctx.info(&format!(
            "Forgetting {} with {} selected device(s) in {}",
            prefs.email,
            prefs.selected_device_ids.len(),
            store.path().display()
        ));
    }
    adapter.clear();
    ctx.success("Settings reset.");
    Ok(())
}
