//! User-initiated actions. Each handler validates locally, makes one call, refreshes what
//! it changed and reports the outcome as a toast. When a handler returns `Err` the user
//! has already been told.

use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApplicationAction, Upload};
use crate::error::{ActionError, ApiError, ValidationError};
use crate::models::{
    AttendanceData, BankDetails, Credentials, JobReport, NewJob, Profile, ProfileUpdate,
    Registration, UserSession, UserType,
};
use crate::pages::Pages;
use crate::poll::ChatPoll;
use crate::surface::Navigator;
use crate::toast::ToastChannel;

const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";
const IFSC_PATTERN: &str = r"^[A-Z]{4}0[A-Z0-9]{6}$";
const MY_APPLICATIONS_PATH: &str = "/staff-portal/#my-applications";

pub fn require<'a>(field: &'static str, value: &'a str, message: &str) -> Result<&'a str, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::new(field, message))
    } else {
        Ok(value)
    }
}

fn matches(pattern: &str, text: &str) -> bool {
    Regex::new(pattern).map(|re| re.is_match(text)).unwrap_or(false)
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if matches(EMAIL_PATTERN, email) {
        Ok(email.to_string())
    } else {
        Err(ValidationError::new("email", "Please enter a valid email address."))
    }
}

/// Ten-digit Indian mobile number. Spaces, dashes and a leading +91 are accepted and dropped.
pub fn normalize_phone(phone: &str) -> Result<String, ValidationError> {
    let compact: String = phone
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();
    let local = compact.strip_prefix("+91").unwrap_or(&compact);
    if local.len() == 10 && local.chars().all(|c| c.is_ascii_digit()) {
        Ok(local.to_string())
    } else {
        Err(ValidationError::new("phone", "Please enter a valid 10-digit phone number."))
    }
}

pub fn validate_ifsc(ifsc: &str) -> Result<String, ValidationError> {
    let ifsc = ifsc.trim().to_uppercase();
    if matches(IFSC_PATTERN, &ifsc) {
        Ok(ifsc)
    } else {
        Err(ValidationError::new(
            "ifsc_code",
            "Please enter a valid IFSC code (e.g. SBIN0001234).",
        ))
    }
}

pub fn validate_account_number(number: &str) -> Result<String, ValidationError> {
    let number = number.trim();
    if (9..=18).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit()) {
        Ok(number.to_string())
    } else {
        Err(ValidationError::new(
            "account_number",
            "Account number must be 9 to 18 digits.",
        ))
    }
}

pub fn parse_amount(raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
        _ => Err(ValidationError::new("amount", "Please enter a valid amount.")),
    }
}

/// The `message` a successful mutation answers with, or `fallback`.
fn server_message(value: &Value, fallback: &str) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn already_applied(err: &ApiError) -> bool {
    match err {
        ApiError::Http { body, .. } => body
            .get("already_applied")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        _ => false,
    }
}

pub struct Actions {
    api: Arc<ApiClient>,
    pages: Arc<Pages>,
    toasts: ToastChannel,
    navigator: Arc<dyn Navigator>,
    chat: Arc<ChatPoll>,
}

impl Actions {
    pub fn new(
        api: Arc<ApiClient>,
        pages: Arc<Pages>,
        toasts: ToastChannel,
        navigator: Arc<dyn Navigator>,
        chat: Arc<ChatPoll>,
    ) -> Self {
        Self {
            api,
            pages,
            toasts,
            navigator,
            chat,
        }
    }

    pub fn toasts(&self) -> &ToastChannel {
        &self.toasts
    }

    fn reject(&self, err: ValidationError) -> ActionError {
        debug!(field = err.field, message = %err.message, "validation failed");
        self.toasts.warning(err.message.clone());
        ActionError::Validation(err)
    }

    fn report(&self, err: ApiError, fallback: &str, network: &str) -> ActionError {
        warn!(error = %err, "action failed");
        let message = if err.is_network() {
            network.to_string()
        } else {
            err.user_message(fallback)
        };
        self.toasts.error(message);
        ActionError::Api(err)
    }

    fn signed_in(&self, message: &str) -> Result<UserSession, ActionError> {
        self.api
            .session()
            .get()
            .ok_or_else(|| self.reject(ValidationError::new("session", message)))
    }

    // auth

    pub async fn login(&self, username: &str, password: &str) -> Result<UserSession, ActionError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(self.reject(ValidationError::new(
                "username",
                "Please enter username and password.",
            )));
        }
        let credentials = Credentials {
            username: username.to_string(),
            password: password.to_string(),
        };
        let response = self
            .api
            .login(&credentials)
            .await
            .map_err(|e| self.report(e, "Login failed", "Network error during login"))?;

        let user = match response.get("profile") {
            Some(profile) if profile.is_object() => serde_json::from_value::<UserSession>(profile.clone())
                .unwrap_or_else(|e| {
                    warn!(error = %e, "login profile unreadable; keeping username only");
                    UserSession {
                        username: username.to_string(),
                        ..Default::default()
                    }
                }),
            _ => UserSession {
                username: username.to_string(),
                ..Default::default()
            },
        };
        self.api.session().save(Some(user.clone()));
        self.toasts.success(format!("Welcome back, {}!", user.username));

        let home = match user.user_type {
            UserType::Organizer => UserType::Organizer.home_path(),
            _ => UserType::Staff.home_path(),
        };
        self.navigator.redirect(home);
        Ok(user)
    }

    pub async fn signup(&self, registration: Registration) -> Result<(), ActionError> {
        if registration.username.trim().is_empty() || registration.password.is_empty() {
            return Err(self.reject(ValidationError::new(
                "username",
                "Username and password are required.",
            )));
        }
        let email = if registration.email.trim().is_empty() {
            String::new()
        } else {
            validate_email(&registration.email).map_err(|e| self.reject(e))?
        };
        let registration = Registration {
            username: registration.username.trim().to_string(),
            email,
            city: registration.city.trim().to_string(),
            ..registration
        };

        self.api.register(&registration).await.map_err(|e| {
            self.report(e, "Registration failed", "Network error during registration")
        })?;
        info!(username = %registration.username, "account created");
        self.toasts
            .success("Account created successfully! Please log in.");
        self.navigator.redirect("/login/");
        Ok(())
    }

    /// Server logout is best effort; the local session goes regardless.
    pub async fn logout(&self) {
        if let Err(e) = self.api.logout().await {
            warn!(error = %e, "server logout failed; clearing locally");
        }
        self.chat.stop();
        self.api.session().clear();
        self.toasts.success("Logged out successfully");
        self.navigator.redirect("/");
    }

    // jobs

    pub async fn post_job(&self, job: NewJob) -> Result<Value, ActionError> {
        self.signed_in("Please log in to post a job.")?;
        let check = || -> Result<(), ValidationError> {
            let message = "Please fill in all required fields.";
            require("title", &job.title, message)?;
            require("role", &job.role, message)?;
            require("date", &job.date, message)?;
            require("location", &job.location, message)?;
            require("pay_rate", &job.pay_rate, message)?;
            parse_amount(&job.pay_rate)
                .map_err(|_| ValidationError::new("pay_rate", "Pay rate must be a positive number."))?;
            if job.number_of_staff == 0 {
                return Err(ValidationError::new("number_of_staff", "At least one staff member is required."));
            }
            Ok(())
        };
        check().map_err(|e| self.reject(e))?;

        let response = self.api.create_job(&job).await.map_err(|e| {
            self.report(e, "Failed to create job", "Network error while creating job")
        })?;
        self.toasts.success("Job posted successfully!");
        let _ = self.pages.my_jobs(None).await;
        Ok(response)
    }

    /// Staff application. The resume is mandatory; without one nothing is sent.
    pub async fn apply_to_job(
        &self,
        job_id: i64,
        cover_message: &str,
        resume: Option<Upload>,
    ) -> Result<Value, ActionError> {
        let user = self.signed_in("Please log in to apply for jobs.")?;
        let Some(resume) = resume else {
            return Err(self.reject(ValidationError::new(
                "resume",
                "Please attach your resume to apply.",
            )));
        };

        match self
            .api
            .apply_to_job(job_id, &user.username, cover_message.trim(), resume)
            .await
        {
            Ok(response) => {
                info!(job_id, "application submitted");
                self.toasts.success("Application submitted successfully!");
                self.navigator.redirect(MY_APPLICATIONS_PATH);
                let _ = self.pages.staff_applications().await;
                Ok(response)
            }
            Err(e) if already_applied(&e) => {
                self.toasts.warning("You have already applied to this job");
                Err(ActionError::Api(e))
            }
            Err(e) => Err(self.report(e, "Failed to apply", "Network error while applying")),
        }
    }

    pub async fn finish_job(&self, job_id: i64) -> Result<Value, ActionError> {
        let response = self.api.finish_job(job_id).await.map_err(|e| {
            self.report(e, "Failed to finish job", "Network error while finishing job")
        })?;
        self.toasts
            .success(server_message(&response, "Job marked as completed"));
        let _ = self.pages.my_jobs(None).await;
        Ok(response)
    }

    pub async fn track_attendance(&self, job_id: i64) -> Result<AttendanceData, ActionError> {
        let attendance = self.api.track_attendance(job_id).await.map_err(|e| {
            self.report(e, "Failed to load attendance", "Network error while loading attendance")
        })?;
        self.toasts
            .success(format!("Attendance code: {}", attendance.tracking_code));
        Ok(attendance)
    }

    pub async fn job_report(&self, job_id: i64) -> Result<JobReport, ActionError> {
        let report = self.api.job_report(job_id).await.map_err(|e| {
            self.report(e, "Failed to generate report", "Network error while generating report")
        })?;
        self.toasts.success("Report generated");
        Ok(report)
    }

    // applications

    pub async fn set_application_status(
        &self,
        application_id: i64,
        action: ApplicationAction,
    ) -> Result<Value, ActionError> {
        let response = self
            .api
            .update_application(application_id, action)
            .await
            .map_err(|e| self.report(e, "Failed to update application", "Error updating application"))?;
        self.toasts
            .success(format!("Application {}!", action.past_tense()));

        let is_organizer = self
            .api
            .session()
            .get()
            .is_some_and(|u| u.user_type == UserType::Organizer);
        if is_organizer {
            let _ = self.pages.organizer_dashboard().await;
        } else {
            let _ = self.pages.staff_applications().await;
        }
        Ok(response)
    }

    /// Pays out an accepted application. The amount is whatever the server settles on.
    pub async fn release_payment(&self, application_id: i64) -> Result<Value, ActionError> {
        let response = self
            .api
            .release_payment(application_id)
            .await
            .map_err(|e| self.report(e, "Failed to release payment", "Network error while releasing payment"))?;
        self.toasts
            .success(server_message(&response, "Payment released successfully"));
        let _ = self.pages.organizer_dashboard().await;
        Ok(response)
    }

    // profile

    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<UserSession, ActionError> {
        self.signed_in("Please log in to update profile.")?;
        let validated = (|| -> Result<ProfileUpdate, ValidationError> {
            let email = match update.email.as_deref().map(str::trim) {
                Some(email) if !email.is_empty() => Some(validate_email(email)?),
                _ => None,
            };
            let phone = match update.phone.as_deref().map(str::trim) {
                Some(phone) if !phone.is_empty() => Some(normalize_phone(phone)?),
                _ => None,
            };
            if let Some(pay) = update.expected_pay.as_deref().filter(|p| !p.trim().is_empty()) {
                parse_amount(pay).map_err(|_| {
                    ValidationError::new("expected_pay", "Expected pay must be a positive number.")
                })?;
            }
            Ok(ProfileUpdate {
                email,
                phone,
                ..update.clone()
            })
        })()
        .map_err(|e| self.reject(e))?;

        let response = self.api.update_profile(&validated).await.map_err(|e| {
            self.report(e, "Profile update failed", "Network error while updating profile")
        })?;
        let merged = match response.get("profile") {
            Some(profile) => self.api.session().merge(profile),
            None => self.api.session().refresh_from_server(&self.api).await,
        };
        self.toasts.success("Profile updated successfully!");
        Ok(merged.or_else(|| self.api.session().get()).unwrap_or_default())
    }

    /// The returned picture URL lives in memory only; it is never persisted.
    pub async fn upload_photo(&self, photo: Upload) -> Result<Value, ActionError> {
        self.signed_in("Please log in to upload a photo.")?;
        let response = self
            .api
            .upload_photo(photo)
            .await
            .map_err(|e| self.report(e, "Upload failed", "Failed to upload photo"))?;
        let url = response.get("photo_url").and_then(Value::as_str);
        if let (Some(url), Some(mut user)) = (url, self.api.session().get()) {
            user.profile_picture = Some(url.to_string());
            self.api.session().save(Some(user));
        }
        self.toasts
            .success(server_message(&response, "Photo uploaded successfully"));
        Ok(response)
    }

    pub async fn upload_video(&self, video: Upload) -> Result<Value, ActionError> {
        self.signed_in("Please log in to upload a video.")?;
        let response = self
            .api
            .upload_video(video)
            .await
            .map_err(|e| self.report(e, "Upload failed", "Failed to upload video"))?;
        self.toasts
            .success(server_message(&response, "Video uploaded successfully"));
        self.api.session().refresh_from_server(&self.api).await;
        Ok(response)
    }

    pub async fn view_profile(&self, profile_id: i64) -> Result<Profile, ActionError> {
        self.pages.profile_modal(profile_id).await.map_err(|e| {
            self.report(e, "Failed to load profile", "Network error while loading profile")
        })
    }

    // wallet

    pub async fn add_funds(&self, amount: &str) -> Result<Value, ActionError> {
        let amount = parse_amount(amount).map_err(|e| self.reject(e))?;
        let response = self.api.add_funds(amount).await.map_err(|e| {
            self.report(e, "Failed to add funds", "Network error while adding funds")
        })?;
        self.toasts
            .success(server_message(&response, "Funds added successfully"));
        let _ = self.pages.wallet().await;
        Ok(response)
    }

    pub async fn withdraw(&self, amount: &str) -> Result<Value, ActionError> {
        let amount = parse_amount(amount).map_err(|e| self.reject(e))?;
        let response = self
            .api
            .withdraw(amount)
            .await
            .map_err(|e| self.report(e, "Withdrawal failed", "Failed to process withdrawal"))?;
        self.toasts
            .success(server_message(&response, "Withdrawal successful"));
        let _ = self.pages.wallet().await;
        Ok(response)
    }

    pub async fn load_bank_details(&self) -> Result<BankDetails, ActionError> {
        self.pages.bank_details().await.map_err(|e| {
            self.report(e, "Failed to load bank details", "Network error while loading bank details")
        })
    }

    pub async fn update_bank_details(&self, details: BankDetails) -> Result<Value, ActionError> {
        let validated = (|| -> Result<BankDetails, ValidationError> {
            let holder = require("account_holder", &details.account_holder, "Account holder name is required.")?;
            Ok(BankDetails {
                account_holder: holder.to_string(),
                account_number: validate_account_number(&details.account_number)?,
                ifsc_code: validate_ifsc(&details.ifsc_code)?,
                bank_name: details.bank_name.trim().to_string(),
                branch: details.branch.trim().to_string(),
            })
        })()
        .map_err(|e| self.reject(e))?;

        let response = self
            .api
            .update_bank_details(&validated)
            .await
            .map_err(|e| self.report(e, "Failed to update bank details", "Network error while saving bank details"))?;
        self.toasts
            .success(server_message(&response, "Bank details updated successfully"));
        let _ = self.pages.bank_details().await;
        Ok(response)
    }

    // verification

    pub async fn submit_verification(
        &self,
        document_type: &str,
        document: Option<Upload>,
        video: Option<Upload>,
    ) -> Result<Value, ActionError> {
        self.signed_in("Please log in to submit verification.")?;
        let document_type = require("document_type", document_type, "Please choose a document type.")
            .map_err(|e| self.reject(e))?;
        let Some(document) = document else {
            return Err(self.reject(ValidationError::new(
                "document",
                "Please upload an identity document.",
            )));
        };

        let response = self
            .api
            .submit_verification(document_type, document, video)
            .await
            .map_err(|e| {
                self.report(e, "Verification submission failed", "Network error while submitting verification")
            })?;
        self.toasts.success(server_message(
            &response,
            "Verification submitted! We will review your documents shortly.",
        ));
        let _ = self.pages.verification_banner().await;
        Ok(response)
    }

    // messages

    /// Opens a conversation (or closes it with `None`) and keeps it fresh in the background.
    pub async fn select_conversation(&self, partner_id: Option<i64>) -> Result<(), ActionError> {
        self.chat.select(partner_id);
        let Some(partner_id) = partner_id else {
            return Ok(());
        };
        let _ = self.pages.conversations(Some(partner_id)).await;
        self.pages
            .chat(partner_id)
            .await
            .map(drop)
            .map_err(|e| self.report(e, "Failed to load messages", "Network error while loading messages"))
    }

    pub async fn send_message(&self, text: &str) -> Result<Value, ActionError> {
        self.signed_in("Please log in to send messages.")?;
        let text = require("text", text, "Please enter a message.").map_err(|e| self.reject(e))?;
        let Some(partner_id) = self.chat.active_partner() else {
            return Err(self.reject(ValidationError::new(
                "recipient_id",
                "Please select a conversation first.",
            )));
        };

        let response = self
            .api
            .send_message(partner_id, text)
            .await
            .map_err(|e| self.report(e, "Failed to send message", "Network error while sending message"))?;
        self.toasts.success("Message sent");
        let _ = self.pages.chat(partner_id).await;
        let _ = self.pages.conversations(Some(partner_id)).await;
        Ok(response)
    }
}
