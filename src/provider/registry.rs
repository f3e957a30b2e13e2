//! Ordered provider registries
//!
//! The same registry type backs all three categories; what differs is the
//! detection rule each category calls:
//!
//! - containers: [`Registry::detect_first`], most specific layout first
//! - JREs: [`Registry::detect_exactly_one`]
//! - agents: [`Registry::detect_all`], failures isolated per agent

use super::{Context, Provider};
use crate::error::{BuildpackError, Category, Result};
use tracing::{debug, warn};

/// A provider that matched, with its registry position and detection tag
pub struct Detected<'a, P: ?Sized> {
    pub index: usize,
    pub provider: &'a P,
    pub tag: String,
}

impl<'a, P: Provider + ?Sized> Detected<'a, P> {
    pub fn id(&self) -> &'static str {
        self.provider.id()
    }
}

impl<P: ?Sized> Clone for Detected<'_, P> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            provider: self.provider,
            tag: self.tag.clone(),
        }
    }
}

impl<P: Provider + ?Sized> std::fmt::Debug for Detected<'_, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detected")
            .field("index", &self.index)
            .field("provider", &self.provider.id())
            .field("tag", &self.tag)
            .finish()
    }
}

/// Providers of one category in registration order
pub struct Registry<P: ?Sized> {
    category: Category,
    providers: Vec<Box<P>>,
}

impl<P: Provider + ?Sized> Registry<P> {
    pub fn new(category: Category, providers: Vec<Box<P>>) -> Self {
        Self {
            category,
            providers,
        }
    }

    fn detect_one(&self, index: usize, ctx: &Context<'_>) -> Result<Option<Detected<'_, P>>> {
        let provider = self.providers[index].as_ref();
        let tag = provider.detect(&ctx.for_registration(index))?;
        debug!(
            category = %self.category,
            provider = provider.id(),
            matched = tag.is_some(),
            "Detection"
        );
        Ok(tag.map(|tag| Detected {
            index,
            provider,
            tag,
        }))
    }

    /// First provider in registration order that matches.
    ///
    /// Errors (including ambiguity) abort the pass instead of falling through
    /// to a less specific provider.
    pub fn detect_first(&self, ctx: &Context<'_>) -> Result<Option<Detected<'_, P>>> {
        for index in 0..self.providers.len() {
            if let Some(detected) = self.detect_one(index, ctx)? {
                return Ok(Some(detected));
            }
        }
        Ok(None)
    }

    /// The single matching provider; none or several is an error
    pub fn detect_exactly_one(&self, ctx: &Context<'_>) -> Result<Detected<'_, P>> {
        let mut matched = Vec::new();
        for index in 0..self.providers.len() {
            if let Some(detected) = self.detect_one(index, ctx)? {
                matched.push(detected);
            }
        }

        match matched.len() {
            0 => Err(BuildpackError::NoMatch {
                category: self.category,
            }),
            1 => Ok(matched.remove(0)),
            _ => {
                let ids: Vec<&str> = matched.iter().map(|d| d.id()).collect();
                Err(BuildpackError::Configuration {
                    variable: "JBP_CONFIG_COMPONENTS".to_string(),
                    message: format!(
                        "more than one {} configured: {}",
                        self.category,
                        ids.join(", ")
                    ),
                })
            }
        }
    }

    /// Every matching provider.
    ///
    /// A provider whose detection fails with a skippable error is logged and
    /// left out; it never prevents the others from being detected.
    pub fn detect_all(&self, ctx: &Context<'_>) -> Result<Vec<Detected<'_, P>>> {
        let mut matched = Vec::new();
        for index in 0..self.providers.len() {
            match self.detect_one(index, ctx) {
                Ok(Some(detected)) => matched.push(detected),
                Ok(None) => {}
                Err(e) if e.is_agent_skippable() => {
                    warn!(
                        "{} '{}' skipped: {}",
                        self.category,
                        self.providers[index].id(),
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }
        Ok(matched)
    }
}
