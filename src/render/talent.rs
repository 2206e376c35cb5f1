use super::{RUPEE, avatar_url, display_amount_or, empty_state, escape_html};
use crate::models::{Badge, Profile};

const NO_TALENT: &str = "No talent profiles found.";

fn badge_class(badge: Badge) -> &'static str {
    match badge {
        Badge::Elite => "elite",
        Badge::Pro => "pro",
        Badge::RisingStar => "rising",
    }
}

/// Five-star strip for a rating: full stars, one more when the fraction reaches .5,
/// hollow for the rest.
pub fn stars(rating: f64) -> String {
    let rating = rating.clamp(0.0, 5.0);
    let full = rating.floor() as usize;
    let half = usize::from(rating - rating.floor() >= 0.5);
    let filled = (full + half).min(5);
    format!("{}{}", "\u{2605}".repeat(filled), "\u{2606}".repeat(5 - filled))
}

/// First few comma-separated phrases of the bio, which is where staff list their skills.
fn bio_skills(bio: &str) -> Vec<&str> {
    bio.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .collect()
}

/// Public talent directory.
pub fn talent_grid(talents: &[Profile]) -> String {
    if talents.is_empty() {
        return empty_state(NO_TALENT);
    }
    talents
        .iter()
        .map(|talent| {
            let mut verification = String::new();
            if talent.kyc_verified {
                verification.push_str(r#"<span class="verified">KYC</span>"#);
            }
            if talent.video_verified {
                verification.push_str(r#"<span class="verified">Video</span>"#);
            }
            let badge = talent
                .badge
                .map(|b| format!(r#"<span class="badge badge-{}">{}</span>"#, badge_class(b), b.label()))
                .unwrap_or_default();
            let bio = if talent.bio.trim().is_empty() { "No bio available" } else { talent.bio.as_str() };
            format!(
                concat!(
                    r#"<div class="talent-card"><h3>{name}</h3><p class="talent-city">{city}</p>{badge}"#,
                    r#"<p class="talent-bio">{bio}</p><div class="talent-verification">{verification}</div>"#,
                    r#"<button class="btn-secondary view-profile-btn" data-profile-id="{id}">View Profile</button></div>"#
                ),
                name = escape_html(&talent.username),
                city = escape_html(&talent.city),
                badge = badge,
                bio = escape_html(bio),
                verification = verification,
                id = talent.id.unwrap_or_default(),
            )
        })
        .collect()
}

/// Organizer "Find Talent" grid, the one the talent filters run over.
pub fn organizer_talent_grid(talents: &[Profile]) -> String {
    if talents.is_empty() {
        return empty_state(NO_TALENT);
    }
    talents.iter().map(organizer_card).collect()
}

fn organizer_card(talent: &Profile) -> String {
    let name = talent.display_name();
    let role = bio_skills(&talent.bio).first().copied().unwrap_or("Event Professional");
    let badge = talent
        .badge
        .map(|b| format!(r#"<div class="talent-badge {}">{}</div>"#, badge_class(b), b.label()))
        .unwrap_or_default();
    let skills = bio_skills(&talent.bio);
    let skills_html = if skills.is_empty() {
        String::new()
    } else {
        let spans: String = skills
            .iter()
            .map(|s| format!("<span>{}</span>", escape_html(s)))
            .collect();
        format!(r#"<div class="talent-skills">{spans}</div>"#)
    };
    let city = if talent.city.trim().is_empty() { "India" } else { talent.city.as_str() };
    let id = talent.id.unwrap_or_default();

    format!(
        concat!(
            r#"<div class="talent-card" data-profile-id="{id}">"#,
            r#"<div class="talent-header"><img src="{avatar}" alt="{name}">{badge}</div>"#,
            r#"<h3>{name}</h3><p class="talent-role">{role}</p>"#,
            r#"<div class="talent-rating"><span class="stars">{stars}</span><span>{rating:.1} ({reviews} reviews)</span></div>"#,
            "{skills}",
            r#"<div class="talent-info"><p>{city}</p><p>{events} Events</p><p>{rupee}{pay}/day</p></div>"#,
            r#"<div class="talent-actions"><button class="btn-outline view-profile-btn" data-profile-id="{id}">View Profile</button>"#,
            r#"<button class="btn-primary hire-talent-btn" data-talent-id="{id}" data-talent-name="{name}">Hire Now</button></div>"#,
            "</div>"
        ),
        id = id,
        avatar = escape_html(&avatar_url(&name)),
        name = escape_html(&name),
        badge = badge,
        role = escape_html(role),
        stars = stars(talent.average_rating),
        rating = talent.average_rating,
        reviews = talent.total_reviews,
        skills = skills_html,
        city = escape_html(city),
        events = talent.total_events_completed,
        rupee = RUPEE,
        pay = escape_html(&display_amount_or(talent.expected_pay.as_deref(), "N/A")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn talent(id: i64, name: &str, rating: f64, badge: Option<Badge>) -> Profile {
        Profile {
            id: Some(id),
            username: name.into(),
            city: "Pune".into(),
            bio: "Bartending, Hosting, Hindi, Marathi".into(),
            average_rating: rating,
            total_reviews: 8,
            badge,
            expected_pay: Some("2500.00".into()),
            ..Default::default()
        }
    }

    #[test]
    fn test_stars() {
        assert_eq!(stars(4.5), "★★★★★");
        assert_eq!(stars(4.2), "★★★★☆");
        assert_eq!(stars(0.0), "☆☆☆☆☆");
        assert_eq!(stars(9.0), "★★★★★");
    }

    #[test]
    fn test_empty_grids() {
        assert!(talent_grid(&[]).contains("empty-state"));
        assert!(organizer_talent_grid(&[]).contains("empty-state"));
    }

    #[test]
    fn test_organizer_card_content() {
        let html = organizer_talent_grid(&[talent(3, "meera", 4.4, Some(Badge::Elite))]);
        assert!(html.contains(r#"<div class="talent-badge elite">Elite</div>"#));
        assert!(html.contains("<span>4.4 (8 reviews)</span>"));
        assert!(html.contains(r#"<p class="talent-role">Bartending</p>"#));
        assert!(html.contains("<span>Hosting</span><span>Hindi</span>"));
        assert!(!html.contains("Marathi"));
        assert!(html.contains("₹2500/day"));
    }

    #[test]
    fn test_grids_are_idempotent() {
        let talents = vec![talent(1, "a", 3.0, None), talent(2, "<b>", 5.0, Some(Badge::Pro))];
        assert_eq!(talent_grid(&talents), talent_grid(&talents));
        assert_eq!(organizer_talent_grid(&talents), organizer_talent_grid(&talents));
        assert!(talent_grid(&talents).contains("&lt;b&gt;"));
    }
}
