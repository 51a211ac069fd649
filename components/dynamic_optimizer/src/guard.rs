//! Admission guard for compiled artifacts
//!
//! The guard caps how many promoted sites may be live at once across the
//! whole process. Sites are admitted in promotion order; when admitting one
//! more would exceed the cap, the least recently promoted sites are demoted
//! first. Demotion is cooperative: a reclaimed site simply goes back to its
//! interpreted accessor and may be promoted again later.
//!
//! The guard never calls into a site while holding its own lock.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Weak;
use tracing::debug;

/// Identity of one expression site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub u64);

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "site#{}", self.0)
    }
}

/// A promoted site the guard can demote
pub trait Tenured: Send + Sync {
    /// Go back to the interpreted accessor; false when the site was not
    /// promoted any more
    fn reclaim(&self) -> bool;
}

/// Process-wide cap on live compiled artifacts
pub struct AdmissionGuard {
    max_tenured: usize,
    tenured: Mutex<VecDeque<(SiteId, Weak<dyn Tenured>)>>,
}

impl AdmissionGuard {
    /// Guard admitting at most `max_tenured` live sites
    pub fn new(max_tenured: usize) -> Self {
        Self {
            max_tenured,
            tenured: Mutex::new(VecDeque::new()),
        }
    }

    /// The cap
    pub fn max_tenured(&self) -> usize {
        self.max_tenured
    }

    /// Number of admitted sites that are still alive
    pub fn tenured_count(&self) -> usize {
        let mut tenured = self.tenured.lock();
        tenured.retain(|(_, site)| site.strong_count() > 0);
        tenured.len()
    }

    /// Whether admitting another site would exceed the cap
    pub fn is_overloaded(&self) -> bool {
        self.tenured_count() >= self.max_tenured
    }

    /// Admitted site ids, least recently promoted first
    pub fn tenured_ids(&self) -> Vec<SiteId> {
        self.tenured.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Admit `site`, demoting the oldest admitted sites as needed to stay
    /// within the cap. Returns how many sites were demoted.
    ///
    /// Admitting a site that is already admitted moves it to the back.
    pub fn admit(&self, id: SiteId, site: Weak<dyn Tenured>) -> usize {
        let victims = {
            let mut tenured = self.tenured.lock();
            tenured.retain(|(admitted, entry)| *admitted != id && entry.strong_count() > 0);
            let mut victims = Vec::new();
            while !tenured.is_empty() && tenured.len() >= self.max_tenured {
                if let Some(victim) = tenured.pop_front() {
                    victims.push(victim);
                }
            }
            if self.max_tenured > 0 {
                tenured.push_back((id, site));
            }
            victims
        };
        self.demote(victims)
    }

    /// Forget `id`, typically after the site was demoted on its own
    pub fn release(&self, id: SiteId) -> bool {
        let mut tenured = self.tenured.lock();
        let before = tenured.len();
        tenured.retain(|(admitted, _)| *admitted != id);
        tenured.len() != before
    }

    /// Demote and forget every admitted site; returns how many were demoted
    pub fn reset(&self) -> usize {
        let victims: Vec<_> = self.tenured.lock().drain(..).collect();
        self.demote(victims)
    }

    fn demote(&self, victims: Vec<(SiteId, Weak<dyn Tenured>)>) -> usize {
        let mut demoted = 0;
        for (id, site) in victims {
            if let Some(site) = site.upgrade() {
                if site.reclaim() {
                    debug!(site = %id, "reclaimed compiled accessor");
                    demoted += 1;
                }
            }
        }
        demoted
    }
}

impl fmt::Debug for AdmissionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdmissionGuard")
            .field("max_tenured", &self.max_tenured)
            .field("tenured", &self.tenured.lock().len())
            .finish()
    }
}
