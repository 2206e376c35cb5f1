//! Client-side filtering over already-rendered listing markup. Nothing is re-fetched:
//! each card's visibility is decided from its own text.

use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;

use crate::error::ValidationError;

/// Visibility decision for one card, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardMatch {
    /// The card's `data-job-id` / `data-profile-id`, when it carries one.
    pub id: Option<String>,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayRange {
    UpTo2000,
    From2000To3000,
    From3000To5000,
    Above5000,
}

impl PayRange {
    /// Bounds are inclusive on both ends, so a pay of exactly 3000 fits two ranges.
    pub fn contains(self, pay: u64) -> bool {
        match self {
            PayRange::UpTo2000 => pay <= 2000,
            PayRange::From2000To3000 => (2000..=3000).contains(&pay),
            PayRange::From3000To5000 => (3000..=5000).contains(&pay),
            PayRange::Above5000 => pay >= 5000,
        }
    }
}

impl FromStr for PayRange {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0-2000" => Ok(PayRange::UpTo2000),
            "2000-3000" => Ok(PayRange::From2000To3000),
            "3000-5000" => Ok(PayRange::From3000To5000),
            "5000+" => Ok(PayRange::Above5000),
            other => Err(ValidationError::new(
                "pay_range",
                format!("unknown pay range '{other}' (expected 0-2000, 2000-3000, 3000-5000 or 5000+)"),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobFilter {
    pub search: String,
    pub location: String,
    pub event_type: String,
    pub pay_range: Option<PayRange>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TalentFilter {
    pub search: String,
    pub skills: String,
    pub min_rating: Option<f64>,
    pub badge: String,
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

fn first_text(card: ElementRef<'_>, selector: Option<&Selector>) -> Option<String> {
    let selector = selector?;
    card.select(selector).next().map(text_of)
}

fn card_id(card: ElementRef<'_>) -> Option<String> {
    let el = card.value();
    el.attr("data-job-id")
        .or_else(|| el.attr("data-profile-id"))
        .map(str::to_string)
}

/// First run of digits in a pay label, ignoring thousands separators: "₹2,500/day" -> 2500.
pub fn pay_value(text: &str) -> u64 {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Leading decimal of a rating label: "4.4 (8 reviews)" -> 4.4.
fn leading_float(text: &str) -> f64 {
    let number: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    number.parse().unwrap_or(0.0)
}

fn location_words(term: &str) -> Vec<String> {
    term.to_lowercase()
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| w.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

impl JobFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.location.trim().is_empty()
            && self.event_type.trim().is_empty()
            && self.pay_range.is_none()
    }

    pub fn apply(&self, markup: &str) -> Vec<CardMatch> {
        let document = Html::parse_fragment(markup);
        let Some(cards) = selector(".job-listing-card, .job-card") else {
            return Vec::new();
        };
        let location_sel = selector(".job-location");
        let pay_sel = selector(".job-pay");

        let search = self.search.trim().to_lowercase();
        let event_type = self.event_type.trim().to_lowercase();
        let words = location_words(&self.location);
        let location_given = !self.location.trim().is_empty();

        document
            .select(&cards)
            .map(|card| {
                let text = text_of(card).to_lowercase();
                let mut visible = true;

                if !search.is_empty() && !text.contains(&search) {
                    visible = false;
                }
                if location_given {
                    let job_location = first_text(card, location_sel.as_ref())
                        .map(|l| l.trim().to_lowercase())
                        .unwrap_or_else(|| text.clone());
                    let matched = words
                        .iter()
                        .any(|w| job_location.contains(w.as_str()) || w.contains(job_location.as_str()));
                    if !matched {
                        visible = false;
                    }
                }
                if !event_type.is_empty() && !text.contains(&event_type) {
                    visible = false;
                }
                if let Some(range) = self.pay_range {
                    let pay = first_text(card, pay_sel.as_ref())
                        .map(|p| pay_value(&p))
                        .unwrap_or(0);
                    if !range.contains(pay) {
                        visible = false;
                    }
                }

                CardMatch {
                    id: card_id(card),
                    visible,
                }
            })
            .collect()
    }
}

impl TalentFilter {
    pub fn apply(&self, markup: &str) -> Vec<CardMatch> {
        let document = Html::parse_fragment(markup);
        let Some(cards) = selector(".talent-card") else {
            return Vec::new();
        };
        let rating_sel = selector(".talent-rating span:last-child");
        let badge_sel = selector(".talent-badge");

        let search = self.search.trim().to_lowercase();
        let skills = self.skills.trim().to_lowercase();
        let badge = self.badge.trim().to_lowercase();

        document
            .select(&cards)
            .map(|card| {
                let text = text_of(card).to_lowercase();
                let mut visible = true;

                if !search.is_empty() && !text.contains(&search) {
                    visible = false;
                }
                if !skills.is_empty() && !text.contains(&skills) {
                    visible = false;
                }
                if let Some(min) = self.min_rating {
                    let rating = first_text(card, rating_sel.as_ref())
                        .map(|r| leading_float(&r))
                        .unwrap_or(0.0);
                    if rating < min {
                        visible = false;
                    }
                }
                if !badge.is_empty() {
                    let card_badge = first_text(card, badge_sel.as_ref())
                        .unwrap_or_default()
                        .to_lowercase();
                    if !card_badge.contains(&badge) {
                        visible = false;
                    }
                }

                CardMatch {
                    id: card_id(card),
                    visible,
                }
            })
            .collect()
    }
}

/// Ids of the cards left visible.
pub fn visible_ids(matches: &[CardMatch]) -> Vec<&str> {
    matches
        .iter()
        .filter(|m| m.visible)
        .filter_map(|m| m.id.as_deref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Badge, Job, Profile};
    use crate::render::jobs::{ListingStyle, job_listings};
    use crate::render::talent::organizer_talent_grid;
    use std::collections::HashSet;

    fn job(id: i64, pay: &str, location: &str, event_type: &str) -> Job {
        Job {
            id,
            title: format!("Gig {id}"),
            role: "Usher".into(),
            event_type: event_type.into(),
            location: location.into(),
            pay_rate: pay.into(),
            payment_type: "day".into(),
            number_of_staff: 1,
            ..Default::default()
        }
    }

    fn listings() -> String {
        let jobs = vec![
            job(1, "3500.00", "Bandra, Mumbai", "Wedding"),
            job(2, "2500.00", "Koregaon Park, Pune", "Corporate"),
            job(3, "6000", "Andheri, Mumbai", "Concert"),
        ];
        job_listings(&jobs, &HashSet::new(), ListingStyle::Detailed)
    }

    fn visibility(matches: &[CardMatch]) -> Vec<bool> {
        matches.iter().map(|m| m.visible).collect()
    }

    #[test]
    fn test_pay_range_hides_out_of_band_cards() {
        let filter = JobFilter {
            pay_range: Some("2000-3000".parse().unwrap()),
            ..Default::default()
        };
        let matches = filter.apply(&listings());
        assert_eq!(visibility(&matches), vec![false, true, false]);
        assert_eq!(visible_ids(&matches), vec!["2"]);
    }

    #[test]
    fn test_compact_cards_filter_the_same_way() {
        let jobs = vec![job(1, "3500", "Goa", "Wedding"), job(2, "2500", "Goa", "Wedding")];
        let html = job_listings(&jobs, &HashSet::new(), ListingStyle::Compact);
        let filter = JobFilter {
            pay_range: Some(PayRange::From2000To3000),
            ..Default::default()
        };
        assert_eq!(visibility(&filter.apply(&html)), vec![false, true]);
    }

    #[test]
    fn test_location_words_match_either_direction() {
        let filter = JobFilter {
            location: "mumbai, in".into(),
            ..Default::default()
        };
        assert_eq!(visibility(&filter.apply(&listings())), vec![true, false, true]);

        // Short words are ignored entirely, so nothing can match.
        let filter = JobFilter {
            location: "in".into(),
            ..Default::default()
        };
        assert_eq!(visibility(&filter.apply(&listings())), vec![false, false, false]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let filter = JobFilter {
            search: "gig".into(),
            location: "Mumbai".into(),
            event_type: "concert".into(),
            pay_range: Some(PayRange::Above5000),
        };
        assert_eq!(visibility(&filter.apply(&listings())), vec![false, false, true]);
        assert!(!filter.is_empty());
        assert!(JobFilter::default().is_empty());
        assert_eq!(visibility(&JobFilter::default().apply(&listings())), vec![true, true, true]);
    }

    #[test]
    fn test_pay_range_parsing_and_bounds() {
        assert_eq!("5000+".parse::<PayRange>().unwrap(), PayRange::Above5000);
        assert!("lots".parse::<PayRange>().is_err());
        assert!(PayRange::UpTo2000.contains(2000));
        assert!(PayRange::From3000To5000.contains(3000));
        assert!(!PayRange::From3000To5000.contains(5001));
        assert_eq!(pay_value("₹2,500/day"), 2500);
        assert_eq!(pay_value("no pay"), 0);
    }

    #[test]
    fn test_talent_filter() {
        let talent = |id: i64, rating: f64, badge: Option<Badge>, bio: &str| Profile {
            id: Some(id),
            username: format!("t{id}"),
            bio: bio.into(),
            average_rating: rating,
            badge,
            ..Default::default()
        };
        let html = organizer_talent_grid(&[
            talent(1, 4.8, Some(Badge::Elite), "Bartending, Mixology"),
            talent(2, 3.9, Some(Badge::Pro), "Hosting"),
            talent(3, 4.5, None, "Bartending"),
        ]);

        let filter = TalentFilter {
            min_rating: Some(4.0),
            ..Default::default()
        };
        assert_eq!(visibility(&filter.apply(&html)), vec![true, false, true]);

        let filter = TalentFilter {
            skills: "bartending".into(),
            badge: "elite".into(),
            ..Default::default()
        };
        let matches = filter.apply(&html);
        assert_eq!(visible_ids(&matches), vec!["1"]);
    }
}
