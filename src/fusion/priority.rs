//! Static per-category source preferences.

use serde::{Deserialize, Serialize};

use crate::types::{Confidence, SourceId};

/// Logical group of snapshot fields resolved to a single source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    CarIdentity,
    DriverIdentity,
    /// Speed, gear and RPM
    Motion,
    /// Position, laps, delta and car location
    Standing,
    Engine,
    Controls,
    GForces,
    Tyres,
    Brakes,
    Suspension,
    Aids,
    Energy,
    LapTimes,
    Session,
    Track,
    LastEvent,
    Player,
}

impl Category {
    pub const ALL: [Category; 17] = [
        Category::CarIdentity,
        Category::DriverIdentity,
        Category::Motion,
        Category::Standing,
        Category::Engine,
        Category::Controls,
        Category::GForces,
        Category::Tyres,
        Category::Brakes,
        Category::Suspension,
        Category::Aids,
        Category::Energy,
        Category::LapTimes,
        Category::Session,
        Category::Track,
        Category::LastEvent,
        Category::Player,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How a category picks its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preference {
    /// Use this source whenever it has ever produced the category
    Prefer(SourceId),
    /// Higher current quality wins; ties go to the memory feed
    BestAvailable,
}

/// What one source currently offers for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offer {
    pub quality_score: u8,
    pub confidence: Confidence,
}

/// Category to preference mapping.
///
/// Categories without an entry are produced by one source only and are
/// taken from whichever source has them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTable {
    entries: [Option<Preference>; Category::ALL.len()],
}

impl Default for PriorityTable {
    fn default() -> Self {
        use Category::*;
        use Preference::*;
        use SourceId::*;

        Self::empty()
            .with(CarIdentity, Prefer(Broadcasting))
            .with(DriverIdentity, Prefer(Broadcasting))
            .with(Motion, BestAvailable)
            .with(Standing, Prefer(Broadcasting))
            .with(Engine, Prefer(SharedMemory))
            .with(Tyres, Prefer(SharedMemory))
            .with(Brakes, Prefer(SharedMemory))
            .with(Aids, Prefer(SharedMemory))
            .with(LapTimes, Prefer(Broadcasting))
            .with(Session, Prefer(Broadcasting))
            .with(Track, Prefer(Broadcasting))
    }
}

impl PriorityTable {
    /// A table with no entries.
    pub fn empty() -> Self {
        Self { entries: [None; Category::ALL.len()] }
    }

    pub fn with(mut self, category: Category, preference: Preference) -> Self {
        self.entries[category.index()] = Some(preference);
        self
    }

    pub fn preference(&self, category: Category) -> Option<Preference> {
        self.entries[category.index()]
    }

    /// Pick the source for `category`.
    ///
    /// `offer` returns `None` when a source has never produced the category.
    /// For best-available categories, heuristic offers rank below all others
    /// before quality is compared.
    pub fn resolve<F>(&self, category: Category, offer: F) -> Option<SourceId>
    where
        F: Fn(SourceId) -> Option<Offer>,
    {
        let offers = SourceId::ALL.map(|source| offer(source).map(|o| (source, o)));
        let available = || offers.iter().flatten();

        match self.preference(category) {
            Some(Preference::Prefer(preferred)) => {
                if offers[preferred.index()].is_some() {
                    Some(preferred)
                } else {
                    available().map(|(source, _)| *source).next()
                }
            }
            Some(Preference::BestAvailable) => available()
                .fold(None, |best: Option<(SourceId, Offer)>, &(source, candidate)| match best {
                    Some((_, current)) if rank(candidate) <= rank(current) => best,
                    _ => Some((source, candidate)),
                })
                .map(|(source, _)| source),
            None => available().map(|(source, _)| *source).next(),
        }
    }
}

fn rank(offer: Offer) -> (bool, u8) {
    (offer.confidence > Confidence::Heuristic, offer.quality_score)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offer(quality_score: u8) -> Option<Offer> {
        Some(Offer { quality_score, confidence: Confidence::Structured })
    }

    #[test]
    fn fixed_preference_holds_while_preferred_has_data() {
        let table = PriorityTable::default();
        let pick = table.resolve(Category::Engine, |source| match source {
            SourceId::SharedMemory => offer(0),
            SourceId::Broadcasting => offer(90),
        });
        assert_eq!(pick, Some(SourceId::SharedMemory));
    }

    #[test]
    fn fixed_preference_falls_back_when_preferred_never_reported() {
        let table = PriorityTable::default();
        let pick = table.resolve(Category::Track, |source| match source {
            SourceId::SharedMemory => offer(95),
            SourceId::Broadcasting => None,
        });
        assert_eq!(pick, Some(SourceId::SharedMemory));
    }

    #[test]
    fn best_available_uses_quality_and_ties_to_memory() {
        let table = PriorityTable::default();
        let higher_broadcast = table.resolve(Category::Motion, |source| match source {
            SourceId::SharedMemory => offer(0),
            SourceId::Broadcasting => offer(90),
        });
        assert_eq!(higher_broadcast, Some(SourceId::Broadcasting));

        let tie = table.resolve(Category::Motion, |_| offer(0));
        assert_eq!(tie, Some(SourceId::SharedMemory));
    }

    #[test]
    fn heuristic_offer_loses_to_any_other() {
        let table = PriorityTable::default();
        let pick = table.resolve(Category::Motion, |source| match source {
            SourceId::SharedMemory => offer(0),
            SourceId::Broadcasting => {
                Some(Offer { quality_score: 90, confidence: Confidence::Heuristic })
            }
        });
        assert_eq!(pick, Some(SourceId::SharedMemory));
    }

    #[test]
    fn unmapped_category_takes_the_only_producer() {
        let table = PriorityTable::default();
        assert_eq!(table.preference(Category::GForces), None);
        assert_eq!(
            table.resolve(Category::GForces, |source| (source == SourceId::SharedMemory)
                .then_some(Offer { quality_score: 0, confidence: Confidence::Structured })),
            Some(SourceId::SharedMemory)
        );
        assert_eq!(table.resolve(Category::GForces, |_| None), None);
    }

    #[test]
    fn category_indices_match_declaration_order() {
        for (i, category) in Category::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }
}
