//! Stat tiles at the top of the two dashboards. Only counts and sums of what the
//! server returned; nothing here derives business thresholds.

use chrono::NaiveDate;

use super::{RUPEE, escape_html, format_inr};
use crate::models::{Application, ApplicationStatus, Job, UserSession};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StaffStats {
    pub events_completed: usize,
    pub total_earned: f64,
    pub rating: f64,
    pub upcoming: usize,
}

impl StaffStats {
    pub fn from_applications(applications: &[Application], me: Option<&UserSession>, today: NaiveDate) -> Self {
        let accepted: Vec<&Application> = applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Accepted)
            .collect();
        Self {
            events_completed: accepted.len(),
            total_earned: accepted.iter().map(|a| pay(&a.job)).sum(),
            rating: me.map(|u| u.average_rating).unwrap_or_default(),
            upcoming: accepted
                .iter()
                .filter(|a| a.job.event_date().is_some_and(|d| d >= today))
                .count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrganizerStats {
    pub active_jobs: usize,
    pub hired_staff: usize,
    pub upcoming_events: usize,
    pub total_spent: f64,
}

impl OrganizerStats {
    pub fn from_jobs(jobs: &[Job], applications: &[Application], today: NaiveDate) -> Self {
        let hired: Vec<&Application> = applications
            .iter()
            .filter(|a| a.status == ApplicationStatus::Accepted)
            .collect();
        Self {
            active_jobs: jobs.len(),
            hired_staff: hired.len(),
            upcoming_events: jobs
                .iter()
                .filter(|j| j.event_date().is_some_and(|d| d >= today))
                .count(),
            total_spent: hired.iter().map(|a| pay(&a.job)).sum(),
        }
    }
}

fn pay(job: &Job) -> f64 {
    job.pay_rate.trim().parse().unwrap_or(0.0)
}

fn tile(id: &str, value: &str, label: &str) -> String {
    format!(
        r#"<div class="stat-card"><span class="stat-value" id="{id}">{}</span><span class="stat-label">{label}</span></div>"#,
        escape_html(value)
    )
}

pub fn staff_stats(stats: &StaffStats) -> String {
    [
        tile("stat-events-completed", &stats.events_completed.to_string(), "Events Completed"),
        tile(
            "stat-total-earned",
            &format!("{RUPEE}{}", format_inr(&stats.total_earned.to_string())),
            "Total Earned",
        ),
        tile("stat-rating", &format!("{:.1}", stats.rating), "Rating"),
        tile("stat-upcoming", &stats.upcoming.to_string(), "Upcoming"),
    ]
    .concat()
}

pub fn organizer_stats(stats: &OrganizerStats) -> String {
    [
        tile("stat-active-jobs", &stats.active_jobs.to_string(), "Active Jobs"),
        tile("stat-hired-staff", &stats.hired_staff.to_string(), "Hired Staff"),
        tile("stat-upcoming-events", &stats.upcoming_events.to_string(), "Upcoming Events"),
        tile(
            "stat-total-spent",
            &format!("{RUPEE}{:.1}K", stats.total_spent / 1000.0),
            "Total Spent",
        ),
    ]
    .concat()
}
