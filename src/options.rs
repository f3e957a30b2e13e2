//! Deferred JVM option assembly
//!
//! Every contributor (the JRE and each agent) writes its options to its own
//! file under `<deps>/<idx>/java_opts/`, named
//! `<priority>_<registration>_<contributor>.opts`. After all contributors have
//! finalized, [`write_assembly`] reads the directory in `(priority,
//! registration, file name)` order and emits one `profile.d` script exporting
//! `JAVA_OPTS`. The script is sourced at process start, so `$VARS` inside a
//! fragment are expanded then, not during staging.

use crate::error::Result;
use crate::stager::Stager;
use crate::util::fs as fsutil;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

const FRAGMENT_EXT: &str = ".opts";

/// Name of the generated script; sorts after every other profile.d entry
pub const ASSEMBLY_SCRIPT: &str = "zz_java_opts";

/// Options contributed by one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionFragment {
    pub contributor: String,
    pub priority: u32,
    /// Position of the contributor in its registry; breaks priority ties
    pub registration: usize,
    pub content: String,
}

impl OptionFragment {
    pub fn new(
        contributor: impl Into<String>,
        priority: u32,
        registration: usize,
        options: &[String],
    ) -> Self {
        Self {
            contributor: contributor.into(),
            priority,
            registration,
            content: options.join(" "),
        }
    }

    pub fn file_name(&self) -> String {
        format!(
            "{:03}_{:03}_{}{}",
            self.priority, self.registration, self.contributor, FRAGMENT_EXT
        )
    }

    fn parse_file_name(name: &str) -> Option<(u32, usize, String)> {
        let stem = name.strip_suffix(FRAGMENT_EXT)?;
        let mut parts = stem.splitn(3, '_');
        let priority = parts.next()?.parse().ok()?;
        let registration = parts.next()?.parse().ok()?;
        let contributor = parts.next()?.to_string();
        if contributor.is_empty() {
            return None;
        }
        Some((priority, registration, contributor))
    }
}

/// Writes `fragment`, replacing anything the same contributor wrote before
pub fn write_fragment(stager: &Stager, fragment: &OptionFragment) -> Result<PathBuf> {
    let dir = stager.fragments_dir();
    fsutil::create_dir_all(&dir)?;

    for existing in fsutil::list_dir(&dir)? {
        if let Some((_, _, contributor)) = OptionFragment::parse_file_name(&existing) {
            if contributor == fragment.contributor && existing != fragment.file_name() {
                let stale = dir.join(&existing);
                fs::remove_file(&stale).map_err(|e| crate::BuildpackError::io(&stale, e))?;
            }
        }
    }

    let path = dir.join(fragment.file_name());
    fsutil::write_file(&path, &fragment.content)?;
    debug!(
        contributor = %fragment.contributor,
        priority = fragment.priority,
        "Wrote option fragment"
    );
    Ok(path)
}

/// Removes every fragment, used before a fresh finalize pass
pub fn clear_fragments(stager: &Stager) -> Result<()> {
    let dir = stager.fragments_dir();
    if dir.exists() {
        fs::remove_dir_all(&dir).map_err(|e| crate::BuildpackError::io(&dir, e))?;
    }
    Ok(())
}

/// All fragments on disk in assembly order
pub fn read_fragments(stager: &Stager) -> Result<Vec<OptionFragment>> {
    let dir = stager.fragments_dir();
    let mut fragments = Vec::new();

    for name in fsutil::list_dir(&dir)? {
        let Some((priority, registration, contributor)) = OptionFragment::parse_file_name(&name)
        else {
            continue;
        };
        let content = fsutil::read_to_string(&dir.join(&name))?;
        fragments.push((
            name,
            OptionFragment {
                contributor,
                priority,
                registration,
                content: content.trim().to_string(),
            },
        ));
    }

    fragments.sort_by(|(a_name, a), (b_name, b)| {
        (a.priority, a.registration, a_name).cmp(&(b.priority, b.registration, b_name))
    });
    Ok(fragments.into_iter().map(|(_, f)| f).collect())
}

/// Renders the `JAVA_OPTS` export for already-ordered fragments
///
/// Content goes inside the double quotes verbatim; contributors escape literal
/// values with [`crate::util::shell`].
pub fn assemble(fragments: &[OptionFragment]) -> String {
    let contributors: Vec<&str> = fragments.iter().map(|f| f.contributor.as_str()).collect();
    let options: Vec<&str> = fragments
        .iter()
        .map(|f| f.content.as_str())
        .filter(|c| !c.is_empty())
        .collect();

    format!(
        "#!/bin/bash\n# contributors: {}\nexport JAVA_OPTS=\"{}\"\n",
        contributors.join(", "),
        options.join(" ")
    )
}

/// Assembles every fragment into the profile.d script
pub fn write_assembly(stager: &Stager) -> Result<PathBuf> {
    let fragments = read_fragments(stager)?;
    let script = assemble(&fragments);
    let path = stager.write_profile_d(ASSEMBLY_SCRIPT, &script)?;
    info!(
        "Assembled JAVA_OPTS from {} contributor(s)",
        fragments.len()
    );
    Ok(path)
}
