use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Organizer,
    Staff,
    #[default]
    #[serde(other)]
    Unknown,
}

impl UserType {
    /// Landing page for this kind of account.
    pub fn home_path(self) -> &'static str {
        match self {
            UserType::Organizer => "/organizer-dashboard/",
            UserType::Staff => "/staff-portal/",
            UserType::Unknown => "/",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UserType::Organizer => "organizer",
            UserType::Staff => "staff",
            UserType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    RisingStar,
    Pro,
    Elite,
}

impl Badge {
    /// Accepts both the stored key ("rising_star") and the display label ("Rising Star").
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "rising_star" | "rising" => Some(Badge::RisingStar),
            "pro" => Some(Badge::Pro),
            "elite" | "elite_pro" => Some(Badge::Elite),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Badge::RisingStar => "rising_star",
            Badge::Pro => "pro",
            Badge::Elite => "elite",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Badge::RisingStar => "Rising Star",
            Badge::Pro => "Pro",
            Badge::Elite => "Elite",
        }
    }
}

impl Serialize for Badge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

fn de_badge<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Badge>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(Badge::parse))
}

/// Django hands decimals back as strings ("2500.00") and sometimes as numbers; blank
/// columns may come back as null. Everything textual lands here as a plain String.
fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

fn de_opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let text = de_text(deserializer)?;
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn de_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let text = de_text(deserializer)?;
    Ok(text.trim().parse().unwrap_or(0.0))
}

fn de_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let text = de_text(deserializer)?;
    Ok(text.trim().parse().unwrap_or(0))
}

/// Profile of any marketplace user. The signed-in user's copy is the [`UserSession`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "de_text")]
    pub username: String,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default, deserialize_with = "de_text")]
    pub email: String,
    #[serde(default, deserialize_with = "de_text")]
    pub first_name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub last_name: String,
    #[serde(default, deserialize_with = "de_text")]
    pub phone: String,
    #[serde(default, deserialize_with = "de_text")]
    pub city: String,
    #[serde(default, deserialize_with = "de_text")]
    pub bio: String,
    #[serde(default)]
    pub kyc_verified: bool,
    #[serde(default)]
    pub video_verified: bool,
    #[serde(default, deserialize_with = "de_badge")]
    pub badge: Option<Badge>,
    #[serde(default, deserialize_with = "de_f64")]
    pub average_rating: f64,
    #[serde(default, deserialize_with = "de_u32")]
    pub total_reviews: u32,
    #[serde(default, deserialize_with = "de_u32")]
    pub total_events_completed: u32,
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub expected_pay: Option<String>,
    /// Memory only. Never written to durable storage.
    #[serde(default, deserialize_with = "de_opt_text", skip_serializing_if = "Option::is_none")]
    pub profile_picture: Option<String>,
}

pub type UserSession = Profile;

impl Profile {
    /// "First Last" when the account has both, otherwise the username.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if !self.first_name.trim().is_empty() && !self.last_name.trim().is_empty() {
            full.to_string()
        } else if self.username.is_empty() {
            "User".to_string()
        } else {
            self.username.clone()
        }
    }

    pub fn is_fully_verified(&self) -> bool {
        self.kyc_verified && self.video_verified
    }

    /// Copy for durable storage.
    pub fn stripped(&self) -> Self {
        Self {
            profile_picture: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Active,
    Completed,
    Draft,
    Cancelled,
    #[serde(other)]
    Other,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Active => "active",
            JobStatus::Completed => "completed",
            JobStatus::Draft => "draft",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub role: String,
    #[serde(default, deserialize_with = "de_text")]
    pub event_type: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub start_time: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub end_time: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub location: String,
    #[serde(default, deserialize_with = "de_text")]
    pub pay_rate: String,
    #[serde(default, deserialize_with = "de_text")]
    pub payment_type: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub number_of_staff: u32,
    #[serde(default, deserialize_with = "de_text")]
    pub skills: String,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    #[serde(default, deserialize_with = "de_text")]
    pub requirements: String,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub organizer: Option<Profile>,
}

impl Job {
    pub fn skill_list(&self) -> Vec<&str> {
        self.skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn event_date(&self) -> Option<NaiveDate> {
        self.date.as_deref().and_then(parse_date)
    }

    /// Pay rate without the decimal tail the backend adds ("2500.00" -> "2500").
    pub fn pay_display(&self) -> String {
        display_amount(&self.pay_rate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    #[serde(other)]
    Other,
}

impl ApplicationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
            ApplicationStatus::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Application {
    pub id: i64,
    pub job: Job,
    #[serde(default)]
    pub applicant: Option<Profile>,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub cover_message: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender: Profile,
    #[serde(default)]
    pub recipient: Option<Profile>,
    #[serde(default, deserialize_with = "de_text")]
    pub text: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub partner: Profile,
    #[serde(default, deserialize_with = "de_text")]
    pub last_message: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub last_at: Option<String>,
    #[serde(default, deserialize_with = "de_u32")]
    pub unread: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub amount: String,
    #[serde(default, deserialize_with = "de_text")]
    pub status: String,
    #[serde(default, deserialize_with = "de_text")]
    pub note: String,
    #[serde(default, deserialize_with = "de_text")]
    pub event_title: String,
    #[serde(default, deserialize_with = "de_text")]
    pub organizer_name: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonthlyEarning {
    #[serde(default, deserialize_with = "de_text")]
    pub month: String,
    #[serde(default, deserialize_with = "de_text")]
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WalletStats {
    #[serde(default, deserialize_with = "de_text")]
    pub available_balance: String,
    #[serde(default, deserialize_with = "de_text")]
    pub pending_amount: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub pending_count: u32,
    #[serde(default, deserialize_with = "de_text")]
    pub total_earned: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub total_events: u32,
    #[serde(default)]
    pub monthly_earnings: Vec<MonthlyEarning>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(default, alias = "bank_account_holder", deserialize_with = "de_text")]
    pub account_holder: String,
    #[serde(default, alias = "bank_account_number", deserialize_with = "de_text")]
    pub account_number: String,
    #[serde(default, alias = "bank_ifsc_code", deserialize_with = "de_text")]
    pub ifsc_code: String,
    #[serde(default, deserialize_with = "de_text")]
    pub bank_name: String,
    #[serde(default, alias = "bank_branch", deserialize_with = "de_text")]
    pub branch: String,
}

impl BankDetails {
    pub fn is_complete(&self) -> bool {
        !self.account_holder.trim().is_empty()
            && !self.account_number.trim().is_empty()
            && !self.ifsc_code.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VerificationStatus {
    #[serde(default)]
    pub kyc_verified: bool,
    #[serde(default)]
    pub video_verified: bool,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub submitted_at: Option<String>,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub rejection_reason: Option<String>,
}

impl VerificationStatus {
    /// The condition the dashboard waits on: KYC approved by the backend.
    pub fn is_verified(&self) -> bool {
        self.kyc_verified || self.status.as_deref() == Some("approved")
    }
}

/// Check-in details an organizer hands to staff on the event day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttendanceData {
    #[serde(default)]
    pub job_id: i64,
    #[serde(default, deserialize_with = "de_text")]
    pub job_title: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub location: String,
    #[serde(default, deserialize_with = "de_text")]
    pub tracking_code: String,
}

/// Per-job hiring summary.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobReport {
    #[serde(default, deserialize_with = "de_text")]
    pub job_title: String,
    #[serde(default, deserialize_with = "de_opt_text")]
    pub event_date: Option<String>,
    #[serde(default, deserialize_with = "de_text")]
    pub location: String,
    #[serde(default, deserialize_with = "de_u32")]
    pub total_applications: u32,
    #[serde(default, deserialize_with = "de_u32")]
    pub accepted: u32,
    #[serde(default, deserialize_with = "de_u32")]
    pub pending: u32,
    #[serde(default, deserialize_with = "de_u32")]
    pub rejected: u32,
    #[serde(default, deserialize_with = "de_text")]
    pub total_cost: String,
}

impl JobReport {
    pub fn cost_display(&self) -> String {
        display_amount(&self.total_cost)
    }
}

/// Envelope every list endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub user_type: UserType,
    pub city: String,
}

/// Body of `POST /jobs/create/`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NewJob {
    pub title: String,
    pub role: String,
    pub event_type: String,
    pub number_of_staff: u32,
    pub skills: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub pay_rate: String,
    pub payment_type: String,
    pub description: String,
    pub requirements: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_pay: Option<String>,
}

/// Dates arrive as "2025-03-14" or as full ISO timestamps; only the day matters here.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Drops a zero fractional part from a decimal string ("3500.00" -> "3500", "12.50" stays).
pub fn display_amount(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return "0".to_string();
    }
    match raw.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole.to_string(),
        _ => raw.to_string(),
    }
}
