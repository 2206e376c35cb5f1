use super::{RUPEE, avatar_url, capitalize, display_amount_or, escape_html, format_date};
use crate::models::{Profile, UserSession, VerificationStatus};

fn verified_badge(label: &str, verified: bool) -> String {
    if verified {
        format!(r#"<span class="badge-verified">{label} Verified</span>"#)
    } else {
        format!(r#"<span class="badge-pending">{label} Pending</span>"#)
    }
}

fn or_na(text: &str) -> &str {
    if text.trim().is_empty() { "N/A" } else { text }
}

/// Body of the "View Profile" modal.
pub fn profile_modal(profile: &Profile) -> String {
    let name = profile.display_name();
    let picture = profile
        .profile_picture
        .clone()
        .unwrap_or_else(|| avatar_url(&name));
    let badge = profile
        .badge
        .map(|b| format!(r#"<span class="badge-pro">{}</span>"#, b.label()))
        .unwrap_or_default();
    let bio = if profile.bio.trim().is_empty() { "No bio available" } else { profile.bio.as_str() };

    format!(
        concat!(
            r#"<div class="profile-modal-content">"#,
            r#"<div class="profile-modal-header"><img src="{picture}" alt="{name}"><div><h2>{name}</h2>"#,
            r#"<p class="profile-type">{user_type}</p>{badge}</div></div>"#,
            r#"<div class="profile-modal-badges">{kyc}{video}</div>"#,
            r#"<div class="profile-modal-stats">"#,
            r#"<div class="stat"><span class="value">{rating:.1}</span><span class="label">Rating ({reviews} reviews)</span></div>"#,
            r#"<div class="stat"><span class="value">{events}</span><span class="label">Events</span></div>"#,
            r#"<div class="stat"><span class="value">{rupee}{pay}</span><span class="label">Expected Pay</span></div>"#,
            "</div>",
            r#"<div class="profile-modal-details"><p><strong>City:</strong> {city}</p><p><strong>Email:</strong> {email}</p>"#,
            r#"<p><strong>Phone:</strong> {phone}</p><p class="bio">{bio}</p></div>"#,
            "</div>"
        ),
        picture = escape_html(&picture),
        name = escape_html(&name),
        user_type = capitalize(profile.user_type.as_str()),
        badge = badge,
        kyc = verified_badge("KYC", profile.kyc_verified),
        video = verified_badge("Video", profile.video_verified),
        rating = profile.average_rating,
        reviews = profile.total_reviews,
        events = profile.total_events_completed,
        rupee = RUPEE,
        pay = escape_html(&display_amount_or(profile.expected_pay.as_deref(), "N/A")),
        city = escape_html(or_na(&profile.city)),
        email = escape_html(or_na(&profile.email)),
        phone = escape_html(or_na(&profile.phone)),
        bio = escape_html(bio),
    )
}

/// Badge strip on the signed-in user's own profile page.
pub fn profile_badges(user: &UserSession) -> String {
    let mut html = String::new();
    if let Some(badge) = user.badge {
        html.push_str(&format!(
            r#"<span class="profile-badge badge-{}">{}</span>"#,
            badge.key(),
            badge.label()
        ));
    }
    html.push_str(&verified_badge("KYC", user.kyc_verified));
    html.push_str(&verified_badge("Video", user.video_verified));
    html
}

/// Header user menu. Anonymous visitors get the login/signup links.
pub fn nav_user(user: Option<&UserSession>) -> String {
    let Some(user) = user else {
        return concat!(
            r#"<a href="/login/" class="btn-outline">Login</a>"#,
            r#"<a href="/signup/" class="btn-primary">Sign Up</a>"#
        )
        .to_string();
    };
    let name = user.display_name();
    let picture = user
        .profile_picture
        .clone()
        .unwrap_or_else(|| avatar_url(&name));
    format!(
        concat!(
            r#"<div class="nav-user"><a href="{home}" class="nav-user-link">"#,
            r#"<img src="{picture}" alt="{name}" class="nav-avatar"><span>{name}</span></a>"#,
            r#"<button class="btn-outline logout-btn">Logout</button></div>"#
        ),
        home = user.user_type.home_path(),
        picture = escape_html(&picture),
        name = escape_html(&name),
    )
}

/// Dashboard banner: nudges unverified users, confirms once KYC is approved.
pub fn verification_banner(status: &VerificationStatus) -> String {
    if status.is_verified() {
        return concat!(
            r#"<div class="verification-banner verified">"#,
            "<strong>Verified</strong> Your identity has been verified. You can now apply for all jobs.",
            "</div>"
        )
        .to_string();
    }
    match status.status.as_deref() {
        Some("pending") => format!(
            concat!(
                r#"<div class="verification-banner pending"><strong>Verification in progress</strong> "#,
                "Submitted on {submitted}. We will notify you once it is reviewed.</div>"
            ),
            submitted = format_date(status.submitted_at.as_deref()),
        ),
        Some("rejected") => format!(
            concat!(
                r#"<div class="verification-banner rejected"><strong>Verification rejected</strong> {reason} "#,
                r#"<button class="btn-primary verify-now-btn">Resubmit</button></div>"#
            ),
            reason = escape_html(
                status
                    .rejection_reason
                    .as_deref()
                    .unwrap_or("Please resubmit your documents.")
            ),
        ),
        _ => concat!(
            r#"<div class="verification-banner unverified"><strong>Complete your verification</strong> "#,
            "Verified profiles get more bookings. ",
            r#"<button class="btn-primary verify-now-btn">Verify Now</button></div>"#
        )
        .to_string(),
    }
}
