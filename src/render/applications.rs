use chrono::{DateTime, NaiveDate, Utc};

use super::{RUPEE, avatar_url, day_month, empty_state, escape_html, format_date, time_ago, time_range};
use crate::models::{Application, ApplicationStatus};

/// Staff "My Applications" tab: one panel per status plus the tab counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationBoard {
    pub pending: String,
    pub accepted: String,
    pub rejected: String,
    pub counts: String,
}

pub fn staff_applications(applications: &[Application], now: DateTime<Utc>) -> ApplicationBoard {
    let by_status = |status: ApplicationStatus| -> Vec<&Application> {
        applications.iter().filter(|a| a.status == status).collect()
    };
    let pending = by_status(ApplicationStatus::Pending);
    let accepted = by_status(ApplicationStatus::Accepted);
    let rejected = by_status(ApplicationStatus::Rejected);

    let panel = |apps: &[&Application], empty: &str| -> String {
        if apps.is_empty() {
            empty_state(empty)
        } else {
            apps.iter().map(|a| application_card(a, now)).collect()
        }
    };

    ApplicationBoard {
        counts: format!(
            r#"<span id="pending-count">({})</span><span id="accepted-count">({})</span><span id="rejected-count">({})</span>"#,
            pending.len(),
            accepted.len(),
            rejected.len()
        ),
        pending: panel(&pending, "No pending applications."),
        accepted: panel(
            &accepted,
            "No accepted applications. Accepted applications move to \"My Bookings\".",
        ),
        rejected: panel(&rejected, "No rejected applications."),
    }
}

fn application_card(app: &Application, now: DateTime<Utc>) -> String {
    let (badge_class, label) = match app.status {
        ApplicationStatus::Pending => ("pending", "Under Review"),
        ApplicationStatus::Accepted => ("confirmed", "Accepted"),
        _ => ("closed", "Closed"),
    };
    let job = &app.job;
    let organizer = job
        .organizer
        .as_ref()
        .map(|o| o.username.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown Organizer");
    let withdraw = if app.status == ApplicationStatus::Pending {
        format!(
            r#"<button class="btn-outline btn-sm withdraw-application-btn" data-application-id="{}">Withdraw</button>"#,
            app.id
        )
    } else {
        String::new()
    };

    format!(
        concat!(
            r#"<div class="application-card" data-application-id="{id}">"#,
            r#"<div class="application-header"><div><h3>{title}</h3><p>{organizer} &bull; {location}</p></div>"#,
            r#"<span class="status-badge {badge_class}">{label}</span></div>"#,
            r#"<div class="application-details"><p>{date} &bull; {time}</p><p>{rupee}{pay}/{payment_type}</p></div>"#,
            r#"<div class="application-footer"><span class="applied-date">Applied {ago}</span>{withdraw}</div>"#,
            "</div>"
        ),
        id = app.id,
        title = escape_html(&job.title),
        organizer = escape_html(organizer),
        location = escape_html(&job.location),
        badge_class = badge_class,
        label = label,
        date = format_date(job.date.as_deref()),
        time = time_range(job.start_time.as_deref(), job.end_time.as_deref()),
        rupee = RUPEE,
        pay = escape_html(&job.pay_display()),
        payment_type = escape_html(&job.payment_type),
        ago = time_ago(app.created_at.as_deref(), now),
        withdraw = withdraw,
    )
}

/// Staff "My Bookings": accepted applications split around `today`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingBoard {
    pub upcoming: String,
    pub completed: String,
    pub counts: String,
}

pub fn bookings(applications: &[Application], today: NaiveDate) -> BookingBoard {
    let accepted = applications
        .iter()
        .filter(|a| a.status == ApplicationStatus::Accepted);
    let (upcoming, completed): (Vec<&Application>, Vec<&Application>) =
        accepted.partition(|a| a.job.event_date().is_none_or(|d| d >= today));

    let panel = |apps: &[&Application], is_upcoming: bool, empty: &str| -> String {
        if apps.is_empty() {
            empty_state(empty)
        } else {
            apps.iter().map(|a| booking_card(a, is_upcoming)).collect()
        }
    };

    BookingBoard {
        counts: format!(
            r#"<span id="upcoming-bookings-count">({})</span><span id="completed-bookings-count">({})</span>"#,
            upcoming.len(),
            completed.len()
        ),
        upcoming: panel(&upcoming, true, "No upcoming bookings."),
        completed: panel(&completed, false, "No completed bookings."),
    }
}

fn booking_card(app: &Application, upcoming: bool) -> String {
    let job = &app.job;
    let (day, month) = day_month(job.event_date());
    let organizer = job
        .organizer
        .as_ref()
        .map(|o| o.username.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown Organizer");
    let (badge_class, label) = if upcoming {
        ("confirmed", "Confirmed")
    } else {
        ("completed", "Completed")
    };

    format!(
        concat!(
            r#"<div class="booking-card" data-application-id="{id}">"#,
            r#"<div class="booking-header"><div class="booking-date-badge"><span class="day">{day}</span><span class="month">{month}</span></div>"#,
            r#"<div class="booking-info"><h3>{title}</h3><p class="organizer">{organizer}</p><p>{location}</p></div>"#,
            r#"<span class="status-badge {badge_class}">{label}</span></div>"#,
            r#"<div class="booking-details">"#,
            r#"<div class="detail-item"><span class="label">Time:</span><span class="value">{time}</span></div>"#,
            r#"<div class="detail-item"><span class="label">Role:</span><span class="value">{role}</span></div>"#,
            r#"<div class="detail-item"><span class="label">Payment:</span><span class="value">{rupee}{pay}</span></div>"#,
            "</div></div>"
        ),
        id = app.id,
        day = day,
        month = month,
        title = escape_html(&job.title),
        organizer = escape_html(organizer),
        location = escape_html(&job.location),
        badge_class = badge_class,
        label = label,
        time = time_range(job.start_time.as_deref(), job.end_time.as_deref()),
        role = escape_html(&job.role),
        rupee = RUPEE,
        pay = escape_html(&job.pay_display()),
    )
}

/// Organizer dashboard: the latest pending applications with accept/reject controls.
pub fn recent_applications(applications: &[Application]) -> String {
    let pending: Vec<&Application> = applications
        .iter()
        .filter(|a| a.status == ApplicationStatus::Pending)
        .take(3)
        .collect();
    if pending.is_empty() {
        return empty_state("No pending applications.");
    }
    pending
        .into_iter()
        .map(|app| {
            let applicant = app.applicant.clone().unwrap_or_default();
            let name = applicant.display_name();
            let badge = applicant
                .badge
                .map(|b| format!(r#"<span class="badge-pro">{}</span>"#, b.label()))
                .unwrap_or_default();
            format!(
                concat!(
                    r#"<div class="application-item" data-application-id="{id}"><img src="{avatar}" alt="{name}">"#,
                    r#"<div class="application-details"><h4>{name}</h4><p>{role}</p>{badge}</div>"#,
                    r#"<div class="application-actions">"#,
                    r#"<button class="btn-sm btn-success" data-application-id="{id}" data-status="accepted">Accept</button>"#,
                    r#"<button class="btn-sm btn-outline" data-application-id="{id}" data-status="rejected">Reject</button>"#,
                    "</div></div>"
                ),
                id = app.id,
                avatar = escape_html(&avatar_url(&name)),
                name = escape_html(&name),
                role = escape_html(&app.job.role),
                badge = badge,
            )
        })
        .collect()
}

/// Staff dashboard: next three confirmed events.
pub fn staff_upcoming_events(applications: &[Application], today: NaiveDate) -> String {
    let mut upcoming: Vec<&Application> = applications
        .iter()
        .filter(|a| a.status == ApplicationStatus::Accepted)
        .filter(|a| a.job.event_date().is_some_and(|d| d >= today))
        .collect();
    upcoming.sort_by_key(|a| a.job.event_date());
    upcoming.truncate(3);

    if upcoming.is_empty() {
        return empty_state("No upcoming events. Find jobs to apply!");
    }
    upcoming
        .into_iter()
        .map(|app| {
            let job = &app.job;
            let (day, month) = day_month(job.event_date());
            format!(
                concat!(
                    r#"<div class="event-item"><div class="event-date"><span class="day">{day}</span><span class="month">{month}</span></div>"#,
                    r#"<div class="event-details"><h4>{title}</h4><p>{location}</p><p>{rupee}{pay} &bull; {time}</p></div>"#,
                    r#"<span class="status-badge confirmed">Confirmed</span></div>"#
                ),
                day = day,
                month = month,
                title = escape_html(&job.title),
                location = escape_html(&job.location),
                rupee = RUPEE,
                pay = escape_html(&job.pay_display()),
                time = time_range(job.start_time.as_deref(), job.end_time.as_deref()),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Job, Profile};
    use chrono::TimeZone;

    fn app(id: i64, status: ApplicationStatus, date: Option<&str>) -> Application {
        Application {
            id,
            status,
            job: Job {
                id: id * 10,
                title: format!("Event {id}"),
                role: "Host".into(),
                location: "Goa".into(),
                pay_rate: "1800.00".into(),
                payment_type: "day".into(),
                date: date.map(str::to_string),
                ..Default::default()
            },
            applicant: Some(Profile {
                username: format!("user{id}"),
                ..Default::default()
            }),
            created_at: Some("2025-03-19T12:00:00Z".into()),
            cover_message: String::new(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_board_splits_by_status_with_counts() {
        let apps = vec![
            app(1, ApplicationStatus::Pending, Some("2025-04-01")),
            app(2, ApplicationStatus::Pending, None),
            app(3, ApplicationStatus::Rejected, None),
        ];
        let board = staff_applications(&apps, now());
        assert!(board.counts.contains(r#"<span id="pending-count">(2)</span>"#));
        assert!(board.counts.contains(r#"<span id="accepted-count">(0)</span>"#));
        assert_eq!(board.pending.matches("application-card").count(), 2);
        assert!(board.pending.contains("Applied 1 day ago"));
        assert!(board.pending.contains("withdraw-application-btn"));
        assert!(board.accepted.contains("empty-state"));
        assert!(board.rejected.contains("Closed"));
        assert!(!board.rejected.contains("withdraw-application-btn"));
    }

    #[test]
    fn test_empty_boards() {
        let board = staff_applications(&[], now());
        assert!(board.pending.contains("empty-state"));
        assert!(board.rejected.contains("empty-state"));
        let bookings = bookings(&[], now().date_naive());
        assert!(bookings.upcoming.contains("empty-state"));
        assert!(bookings.completed.contains("empty-state"));
        assert!(recent_applications(&[]).contains("empty-state"));
        assert!(staff_upcoming_events(&[], now().date_naive()).contains("empty-state"));
    }

    #[test]
    fn test_bookings_split_around_today() {
        let today = now().date_naive();
        let apps = vec![
            app(1, ApplicationStatus::Accepted, Some("2025-03-01")),
            app(2, ApplicationStatus::Accepted, Some("2025-03-20")),
            app(3, ApplicationStatus::Pending, Some("2025-05-01")),
        ];
        let board = bookings(&apps, today);
        assert!(board.counts.contains("(1)</span><span id=\"completed-bookings-count\">(1)"));
        assert!(board.upcoming.contains("Event 2"));
        assert!(board.completed.contains("Event 1"));
        assert!(!board.upcoming.contains("Event 3"));
    }

    #[test]
    fn test_recent_applications_only_pending_and_idempotent() {
        let apps = vec![
            app(1, ApplicationStatus::Accepted, None),
            app(2, ApplicationStatus::Pending, None),
        ];
        let html = recent_applications(&apps);
        assert!(html.contains("user2"));
        assert!(!html.contains("user1"));
        assert_eq!(html, recent_applications(&apps));
    }
}
