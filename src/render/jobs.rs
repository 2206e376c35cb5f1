use chrono::NaiveDate;
use std::collections::HashSet;

use super::{RUPEE, day_month, empty_state, escape_html, format_date, time_range};
use crate::models::Job;

/// The staff portal shows detailed cards; the public pages use compact ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStyle {
    Detailed,
    Compact,
}

pub fn job_listings(jobs: &[Job], applied: &HashSet<i64>, style: ListingStyle) -> String {
    if jobs.is_empty() {
        return empty_state("No jobs available at the moment. Check back soon!");
    }
    jobs.iter()
        .map(|job| match style {
            ListingStyle::Detailed => detailed_card(job, applied.contains(&job.id)),
            ListingStyle::Compact => compact_card(job, applied.contains(&job.id)),
        })
        .collect()
}

fn apply_button(job_id: i64, applied: bool) -> String {
    if applied {
        r#"<button class="btn-primary" disabled>Applied</button>"#.to_string()
    } else {
        format!(r#"<button class="btn-primary apply-job-btn" data-job-id="{job_id}">Apply Now</button>"#)
    }
}

fn detailed_card(job: &Job, applied: bool) -> String {
    let organizer = job.organizer.as_ref();
    let organizer_name = organizer
        .map(|o| o.username.as_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("Unknown Organizer");
    let verified = organizer.map(|o| o.kyc_verified).unwrap_or(false);
    let skills = job.skill_list();
    let positions = if job.number_of_staff == 1 { "position" } else { "positions" };
    let description = if job.description.trim().is_empty() {
        "No description available."
    } else {
        job.description.as_str()
    };

    let mut html = String::new();
    html.push_str(&format!(r#"<div class="job-listing-card" data-job-id="{}">"#, job.id));
    html.push_str(&format!(
        r#"<div class="job-listing-header"><div><h3>{}</h3><p class="organizer">{}</p></div><div class="job-pay">{RUPEE}{}<span>/{}</span></div></div>"#,
        escape_html(&job.title),
        escape_html(organizer_name),
        escape_html(&job.pay_display()),
        escape_html(&job.payment_type),
    ));
    html.push_str(&format!(
        r#"<div class="job-listing-details"><span class="job-location">{}</span><span class="job-date">{}</span><span class="job-time">{}</span><span class="job-staff">{} {positions}</span></div>"#,
        escape_html(&job.location),
        format_date(job.date.as_deref()),
        time_range(job.start_time.as_deref(), job.end_time.as_deref()),
        job.number_of_staff,
    ));
    if !skills.is_empty() {
        html.push_str(r#"<div class="job-listing-skills">"#);
        for skill in skills.iter().take(5) {
            html.push_str(&format!("<span>{}</span>", escape_html(skill)));
        }
        html.push_str("</div>");
    }
    html.push_str(&format!(
        r#"<p class="job-listing-description">{}</p>"#,
        escape_html(description)
    ));
    html.push_str(r#"<div class="job-listing-footer"><div class="job-listing-meta">"#);
    if verified {
        html.push_str(r#"<span class="badge-verified">Verified Organizer</span>"#);
    }
    html.push_str(&format!(
        r#"<span class="job-role">{}</span><span class="job-event-type">{}</span></div>{}</div></div>"#,
        escape_html(&job.role),
        escape_html(&job.event_type),
        apply_button(job.id, applied),
    ));
    html
}

fn compact_card(job: &Job, applied: bool) -> String {
    let skills: String = job
        .skill_list()
        .iter()
        .map(|s| format!(r#"<span class="skill-tag">{}</span>"#, escape_html(s)))
        .collect();
    format!(
        concat!(
            r#"<div class="job-card" data-job-id="{id}">"#,
            r#"<div class="job-header"><h3>{title}</h3><span class="badge badge-{type_class}">{event_type}</span></div>"#,
            r#"<div class="job-meta"><span class="job-role">{role}</span><span>{staff} needed</span><span class="job-date">{date}</span><span class="job-location">{location}</span></div>"#,
            r#"<p class="job-description">{description}</p>"#,
            r#"<div class="job-skills">{skills}</div>"#,
            r#"<div class="job-footer"><div class="pay-rate job-pay">{rupee}{pay}/{payment_type}</div>{button}</div>"#,
            "</div>"
        ),
        id = job.id,
        title = escape_html(&job.title),
        type_class = escape_html(&job.event_type.to_lowercase()),
        event_type = escape_html(&job.event_type),
        role = escape_html(&job.role),
        staff = job.number_of_staff,
        date = format_date(job.date.as_deref()),
        location = escape_html(&job.location),
        description = escape_html(&job.description),
        skills = skills,
        rupee = RUPEE,
        pay = escape_html(&job.pay_display()),
        payment_type = escape_html(&job.payment_type),
        button = apply_button(job.id, applied),
    )
}

/// Organizer "My Jobs" tab.
pub fn my_jobs(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return empty_state("No jobs posted yet. Create your first job posting!");
    }
    jobs.iter()
        .map(|job| {
            format!(
                concat!(
                    r#"<div class="job-card" data-job-id="{id}">"#,
                    r#"<div class="job-header"><h3>{title}</h3><span class="badge badge-{status}">{status}</span></div>"#,
                    r#"<div class="job-meta"><span>{role}</span><span>{staff} needed</span><span>{date}</span><span>{location}</span></div>"#,
                    "<p>{description}</p>",
                    r#"<div class="job-footer"><div class="pay-rate">{rupee}{pay}/{payment_type}</div></div>"#,
                    "</div>"
                ),
                id = job.id,
                title = escape_html(&job.title),
                status = job.status.as_str(),
                role = escape_html(&job.role),
                staff = job.number_of_staff,
                date = format_date(job.date.as_deref()),
                location = escape_html(&job.location),
                description = escape_html(&job.description),
                rupee = RUPEE,
                pay = escape_html(&job.pay_display()),
                payment_type = escape_html(&job.payment_type),
            )
        })
        .collect()
}

/// Jobs on or after `today`, soonest first, at most three.
pub fn upcoming_jobs(jobs: &[Job], today: NaiveDate) -> Vec<&Job> {
    let mut upcoming: Vec<&Job> = jobs
        .iter()
        .filter(|job| job.event_date().is_some_and(|d| d >= today))
        .collect();
    upcoming.sort_by_key(|job| job.event_date());
    upcoming.truncate(3);
    upcoming
}

/// Organizer dashboard "Upcoming Events" panel.
pub fn upcoming_events(jobs: &[Job], today: NaiveDate) -> String {
    let upcoming = upcoming_jobs(jobs, today);
    if upcoming.is_empty() {
        return empty_state("No upcoming events scheduled.");
    }
    upcoming
        .into_iter()
        .map(|job| {
            let (day, month) = day_month(job.event_date());
            format!(
                concat!(
                    r#"<div class="event-item"><div class="event-date"><span class="day">{day}</span><span class="month">{month}</span></div>"#,
                    r#"<div class="event-details"><h4>{title}</h4><p>{location}</p><p>{staff} Staff Needed</p></div>"#,
                    r#"<span class="status-badge pending">Active</span></div>"#
                ),
                day = day,
                month = month,
                title = escape_html(&job.title),
                location = escape_html(&job.location),
                staff = job.number_of_staff,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;

    fn job(id: i64, title: &str, pay: &str, date: Option<&str>) -> Job {
        Job {
            id,
            title: title.into(),
            role: "Usher".into(),
            event_type: "Wedding".into(),
            location: "Bandra, Mumbai".into(),
            pay_rate: pay.into(),
            payment_type: "day".into(),
            number_of_staff: 2,
            skills: "Hindi, Crowd control".into(),
            date: date.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_listing_has_empty_state() {
        let html = job_listings(&[], &HashSet::new(), ListingStyle::Detailed);
        assert!(html.contains(r#"class="empty-state""#));
        assert!(my_jobs(&[]).contains("empty-state"));
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(upcoming_events(&[], today).contains("empty-state"));
    }

    #[test]
    fn test_detailed_card_escapes_and_marks_applied() {
        let mut j = job(5, "<b>Host</b>", "2500.00", Some("2025-03-14"));
        j.organizer = Some(Profile {
            username: "Events & Co".into(),
            kyc_verified: true,
            ..Default::default()
        });
        let applied: HashSet<i64> = [5].into_iter().collect();
        let html = job_listings(&[j], &applied, ListingStyle::Detailed);

        assert!(html.contains("&lt;b&gt;Host&lt;/b&gt;"));
        assert!(html.contains("Events &amp; Co"));
        assert!(html.contains("Verified Organizer"));
        assert!(html.contains(r#"<div class="job-pay">₹2500<span>/day</span></div>"#));
        assert!(html.contains(">Applied</button>"));
        assert!(!html.contains("apply-job-btn"));
    }

    #[test]
    fn test_listings_are_idempotent() {
        let jobs = vec![job(1, "A", "100", None), job(2, "B", "200", Some("2025-05-01"))];
        let applied = HashSet::new();
        for style in [ListingStyle::Detailed, ListingStyle::Compact] {
            assert_eq!(job_listings(&jobs, &applied, style), job_listings(&jobs, &applied, style));
        }
        assert_eq!(my_jobs(&jobs), my_jobs(&jobs));
    }

    #[test]
    fn test_upcoming_events_skip_past_and_undated() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let jobs = vec![
            job(1, "Past", "1", Some("2025-03-01")),
            job(2, "Later", "1", Some("2025-04-01")),
            job(3, "Undated", "1", None),
            job(4, "Today", "1", Some("2025-03-10")),
        ];
        let upcoming: Vec<i64> = upcoming_jobs(&jobs, today).iter().map(|j| j.id).collect();
        assert_eq!(upcoming, vec![4, 2]);
        let html = upcoming_events(&jobs, today);
        assert!(html.contains(r#"<span class="day">10</span><span class="month">Mar</span>"#));
    }
}
