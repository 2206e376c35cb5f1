use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::info;
use tracing_subscriber::EnvFilter;

use eventflex::api::{ApplicationAction, Upload};
use eventflex::app::{App, Dashboard};
use eventflex::config::Config;
use eventflex::filter::{JobFilter, PayRange, TalentFilter, visible_ids};
use eventflex::models::{
    Application, ApplicationStatus, BankDetails, NewJob, Profile, ProfileUpdate, Registration, UserSession,
    UserType,
};
use eventflex::render::dashboard::{OrganizerStats, StaffStats};
use eventflex::render::jobs::ListingStyle;
use eventflex::render::wallet::mask_account_number;
use eventflex::render::{format_date, format_inr, time_ago};
use eventflex::session::Page;
use eventflex::surface::{Navigator, slot};
use eventflex::toast::Toast;

#[derive(Parser)]
#[command(name = "eventflex")]
#[command(about = "EventFlex marketplace client - jobs, talent, wallet and messages from the terminal")]
struct Cli {
    /// Backend base URL (overrides EVENTFLEX_API_BASE)
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Directory for the local session store (overrides EVENTFLEX_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        username: String,

        #[arg(short, long, env = "EVENTFLEX_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Create an account
    Signup {
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "EVENTFLEX_PASSWORD", hide_env_values = true)]
        password: String,

        /// Account kind
        #[arg(short = 't', long, value_enum, default_value = "staff")]
        user_type: Role,

        #[arg(short, long, default_value = "")]
        city: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Browse open jobs
    Jobs {
        /// Free-text search over title, organizer and skills
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short, long, default_value = "")]
        location: String,

        #[arg(short, long, default_value = "")]
        event_type: String,

        /// One of 0-2000, 2000-3000, 3000-5000, 5000+
        #[arg(short, long)]
        pay_range: Option<PayRange>,

        /// Print the rendered listing markup instead of a table
        #[arg(long)]
        html: bool,
    },

    /// Show job details
    Show {
        /// Job ID
        id: i64,
    },

    /// Apply to a job (staff)
    Apply {
        /// Job ID
        job_id: i64,

        /// Resume file to attach
        #[arg(short, long)]
        resume: Option<PathBuf>,

        #[arg(short, long, default_value = "")]
        cover: String,
    },

    /// Post a new job (organizer)
    Post(PostArgs),

    /// Mark a job as completed (organizer)
    Finish {
        /// Job ID
        job_id: i64,
    },

    /// Organizer's own postings
    MyJobs {
        /// Filter by status (active, completed, draft, cancelled)
        #[arg(short, long)]
        status: Option<String>,

        #[command(subcommand)]
        command: Option<MyJobsCommands>,
    },

    /// Browse talent
    Talent {
        #[arg(short, long, default_value = "")]
        search: String,

        #[arg(short = 'k', long, default_value = "")]
        skills: String,

        #[arg(short, long)]
        min_rating: Option<f64>,

        /// Rising Star, Pro or Elite
        #[arg(short, long, default_value = "")]
        badge: String,
    },

    /// Applications: list, accept, reject, withdraw, release payment
    Applications {
        #[command(subcommand)]
        command: Option<ApplicationCommands>,
    },

    /// Accepted gigs, upcoming and completed (staff)
    Bookings,

    /// Dashboard stats for the signed-in user
    Dashboard,

    /// Wallet balance and transactions (staff)
    Wallet,

    /// Withdraw from the wallet
    Withdraw {
        /// Amount in rupees
        amount: String,
    },

    /// Add funds to the wallet
    AddFunds {
        /// Amount in rupees
        amount: String,
    },

    /// Payout bank account
    Bank {
        #[command(subcommand)]
        command: Option<BankCommands>,
    },

    /// Conversations, or one thread with --partner
    Messages {
        /// Partner user ID
        #[arg(short, long)]
        partner: Option<i64>,

        /// Keep the thread open and print new messages until Ctrl-C
        #[arg(short, long, requires = "partner")]
        watch: bool,
    },

    /// Send a message
    Send {
        /// Recipient user ID
        #[arg(short, long)]
        to: i64,

        text: String,
    },

    /// Identity verification
    Verify {
        #[command(subcommand)]
        command: Option<VerifyCommands>,
    },

    /// Profiles: view, update, upload media
    Profile {
        #[command(subcommand)]
        command: Option<ProfileCommands>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Role {
    Organizer,
    Staff,
}

impl From<Role> for UserType {
    fn from(role: Role) -> Self {
        match role {
            Role::Organizer => UserType::Organizer,
            Role::Staff => UserType::Staff,
        }
    }
}

#[derive(clap::Args)]
struct PostArgs {
    #[arg(long)]
    title: String,

    #[arg(long, default_value = "")]
    role: String,

    #[arg(long, default_value = "")]
    event_type: String,

    /// Event date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    #[arg(long, default_value = "")]
    start_time: String,

    #[arg(long, default_value = "")]
    end_time: String,

    #[arg(long)]
    location: String,

    #[arg(long)]
    pay_rate: String,

    #[arg(long, default_value = "per_day")]
    payment_type: String,

    #[arg(long, default_value = "1")]
    staff: u32,

    /// Comma-separated skills
    #[arg(long, default_value = "")]
    skills: String,

    #[arg(long, default_value = "")]
    description: String,

    #[arg(long, default_value = "")]
    requirements: String,
}

#[derive(Subcommand)]
enum MyJobsCommands {
    /// Attendance tracking code for a job
    Attendance { id: i64 },
    /// Hiring report for a job
    Report { id: i64 },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// List applications
    List,
    /// Accept an application (organizer)
    Accept { id: i64 },
    /// Reject an application (organizer)
    Reject { id: i64 },
    /// Withdraw your own application (staff)
    Withdraw { id: i64 },
    /// Release payment for an accepted application (organizer)
    Pay { id: i64 },
}

#[derive(Subcommand)]
enum BankCommands {
    /// Show saved bank details
    Show,
    /// Save bank details
    Set {
        #[arg(long)]
        holder: String,
        #[arg(long)]
        account_number: String,
        #[arg(long)]
        ifsc: String,
        #[arg(long, default_value = "")]
        bank_name: String,
        #[arg(long, default_value = "")]
        branch: String,
    },
}

#[derive(Subcommand)]
enum VerifyCommands {
    /// Show verification status
    Status,
    /// Submit identity documents
    Submit {
        /// aadhaar, pan, passport, ...
        #[arg(short = 't', long)]
        document_type: String,
        #[arg(short, long)]
        document: PathBuf,
        #[arg(short, long)]
        video: Option<PathBuf>,
    },
    /// Wait for the review to finish
    Watch,
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show a profile (yours when no ID is given)
    Show { id: Option<i64> },
    /// Update your profile
    Update {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        expected_pay: Option<String>,
    },
    /// Upload a profile photo
    Photo { path: PathBuf },
    /// Upload an introduction video
    Video { path: PathBuf },
}

/// Redirects have no browser to land in; they become a line on stderr.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, path: &str) {
        info!(path, "redirect");
        eprintln!("-> {}", path);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eventflex=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(base) = &cli.api_base {
        config = config.with_api_base(base).context("Invalid --api-base")?;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }

    let navigator: Arc<dyn Navigator> = Arc::new(TerminalNavigator);
    let app = App::open(config, navigator.clone()).context("Failed to start client")?;
    let mut toasts = app.toasts.subscribe();

    let result = run(&app, navigator.as_ref(), cli.command, &mut toasts).await;
    drain_toasts(&mut toasts);
    app.chat.stop();
    app.verification.stop();
    result
}

async fn run(
    app: &App,
    navigator: &dyn Navigator,
    command: Commands,
    toasts: &mut broadcast::Receiver<Toast>,
) -> Result<()> {
    let actions = &app.actions;
    let pages = &app.pages;

    match command {
        Commands::Login { username, password } => {
            let user = actions.login(&username, &password).await?;
            println!("Signed in as {} ({})", user.display_name(), user.user_type.as_str());
        }

        Commands::Signup {
            username,
            email,
            password,
            user_type,
            city,
        } => {
            actions
                .signup(Registration {
                    username: username.clone(),
                    email,
                    password,
                    user_type: user_type.into(),
                    city,
                })
                .await?;
            println!("Account '{}' created. Sign in with `eventflex login {}`.", username, username);
        }

        Commands::Logout => {
            actions.logout().await;
            println!("Signed out.");
        }

        Commands::Whoami => match app.session.get() {
            Some(user) => print_profile(&user),
            None => println!("Not signed in."),
        },

        Commands::Jobs {
            search,
            location,
            event_type,
            pay_range,
            html,
        } => {
            let jobs = pages
                .job_listings(ListingStyle::Detailed)
                .await
                .context("Failed to load jobs")?;
            let markup = app.surface.content(slot::JOB_LISTINGS).unwrap_or_default();
            let filter = JobFilter {
                search,
                location,
                event_type,
                pay_range,
            };
            let matches = filter.apply(&markup);
            let shown: Vec<i64> = visible_ids(&matches)
                .into_iter()
                .filter_map(|id| id.parse().ok())
                .collect();

            if html {
                println!("{}", markup);
            } else if shown.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<6} {:<28} {:<18} {:<14} {:<12} {:>10}",
                    "ID", "TITLE", "LOCATION", "TYPE", "DATE", "PAY"
                );
                println!("{}", "-".repeat(93));
                for job in jobs.iter().filter(|job| shown.contains(&job.id)) {
                    println!(
                        "{:<6} {:<28} {:<18} {:<14} {:<12} {:>10}",
                        job.id,
                        truncate(&job.title, 26),
                        truncate(&job.location, 16),
                        truncate(&job.event_type, 12),
                        format_date(job.date.as_deref()),
                        format!("₹{}", format_inr(&job.pay_rate)),
                    );
                }
                if !filter.is_empty() {
                    println!("\n{} of {} jobs match.", shown.len(), jobs.len());
                }
            }
        }

        Commands::Show { id } => {
            let job = app.api.job_details(id).await.context("Failed to load job")?;
            println!("Job #{}", job.id);
            println!("Title: {}", job.title);
            if let Some(organizer) = &job.organizer {
                let mark = if organizer.kyc_verified { " (verified)" } else { "" };
                println!("Organizer: {}{}", organizer.username, mark);
            }
            println!("Status: {}", job.status.as_str());
            if !job.event_type.is_empty() {
                println!("Event type: {}", job.event_type);
            }
            println!("Location: {}", job.location);
            println!("Date: {}", format_date(job.date.as_deref()));
            if let (Some(start), Some(end)) = (&job.start_time, &job.end_time) {
                println!("Time: {} - {}", start, end);
            }
            println!("Pay: ₹{} {}", format_inr(&job.pay_rate), job.payment_type);
            println!("Staff needed: {}", job.number_of_staff);
            let skills = job.skill_list();
            if !skills.is_empty() {
                println!("Skills: {}", skills.join(", "));
            }
            if !job.description.trim().is_empty() {
                println!("\n--- Description ---");
                println!("{}", textwrap::fill(&job.description, 80));
            }
            if !job.requirements.trim().is_empty() {
                println!("\n--- Requirements ---");
                println!("{}", textwrap::fill(&job.requirements, 80));
            }
        }

        Commands::Apply { job_id, resume, cover } => {
            let resume = match resume {
                Some(path) => Some(read_upload(&path).await?),
                None => None,
            };
            actions.apply_to_job(job_id, &cover, resume).await?;
            println!("Applied to job #{}.", job_id);
        }

        Commands::Post(args) => {
            if !app.session.enter(Page::OrganizerDashboard, navigator) {
                return Err(anyhow!("Posting jobs needs an organizer account"));
            }
            let response = actions
                .post_job(NewJob {
                    title: args.title,
                    role: args.role,
                    event_type: args.event_type,
                    number_of_staff: args.staff,
                    skills: args.skills,
                    date: args.date,
                    start_time: args.start_time,
                    end_time: args.end_time,
                    location: args.location,
                    pay_rate: args.pay_rate,
                    payment_type: args.payment_type,
                    description: args.description,
                    requirements: args.requirements,
                })
                .await?;
            match response.get("id").and_then(|id| id.as_i64()) {
                Some(id) => println!("Posted job #{}.", id),
                None => println!("Job posted."),
            }
        }

        Commands::Finish { job_id } => {
            actions.finish_job(job_id).await?;
            println!("Job #{} marked as completed.", job_id);
        }

        Commands::MyJobs {
            command: Some(MyJobsCommands::Attendance { id }),
            ..
        } => {
            let attendance = actions.track_attendance(id).await?;
            println!("Job:      #{} {}", attendance.job_id, attendance.job_title);
            println!("Date:     {}", format_date(attendance.date.as_deref()));
            println!("Location: {}", attendance.location);
            println!("Code:     {}", attendance.tracking_code);
        }

        Commands::MyJobs {
            command: Some(MyJobsCommands::Report { id }),
            ..
        } => {
            let report = actions.job_report(id).await?;
            println!("{} ({}, {})", report.job_title, format_date(report.event_date.as_deref()), report.location);
            println!("{}", "-".repeat(40));
            println!("Applications: {}", report.total_applications);
            println!("Accepted:     {}", report.accepted);
            println!("Pending:      {}", report.pending);
            println!("Rejected:     {}", report.rejected);
            println!("Total cost:   ₹{}", format_inr(&report.cost_display()));
        }

        Commands::MyJobs { status, command: None } => {
            if !app.session.enter(Page::OrganizerDashboard, navigator) {
                return Ok(());
            }
            let jobs = pages.my_jobs(status.as_deref()).await.context("Failed to load your jobs")?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<6} {:<11} {:<30} {:<12} {:>6} {:>10}", "ID", "STATUS", "TITLE", "DATE", "STAFF", "PAY");
                println!("{}", "-".repeat(80));
                for job in jobs {
                    println!(
                        "{:<6} {:<11} {:<30} {:<12} {:>6} {:>10}",
                        job.id,
                        job.status.as_str(),
                        truncate(&job.title, 28),
                        format_date(job.date.as_deref()),
                        job.number_of_staff,
                        format!("₹{}", format_inr(&job.pay_rate)),
                    );
                }
            }
        }

        Commands::Talent {
            search,
            skills,
            min_rating,
            badge,
        } => {
            let talent = pages
                .organizer_talent_grid()
                .await
                .context("Failed to load talent")?;
            let markup = app.surface.content(slot::ORGANIZER_TALENT_GRID).unwrap_or_default();
            let filter = TalentFilter {
                search,
                skills,
                min_rating,
                badge,
            };
            let matches = filter.apply(&markup);
            let shown: Vec<i64> = visible_ids(&matches)
                .into_iter()
                .filter_map(|id| id.parse().ok())
                .collect();

            let visible: Vec<&Profile> = talent
                .iter()
                .filter(|p| p.id.is_some_and(|id| shown.contains(&id)))
                .collect();
            if visible.is_empty() {
                println!("No talent found.");
            } else {
                println!("{:<6} {:<24} {:<16} {:<12} {:>8} {:>7}", "ID", "NAME", "CITY", "BADGE", "RATING", "EVENTS");
                println!("{}", "-".repeat(78));
                for profile in visible {
                    println!(
                        "{:<6} {:<24} {:<16} {:<12} {:>8.1} {:>7}",
                        profile.id.unwrap_or_default(),
                        truncate(&profile.display_name(), 22),
                        truncate(&profile.city, 14),
                        profile.badge.map(|b| b.label()).unwrap_or("-"),
                        profile.average_rating,
                        profile.total_events_completed,
                    );
                }
            }
        }

        Commands::Applications { command } => match command.unwrap_or(ApplicationCommands::List) {
            ApplicationCommands::List => {
                let user = signed_in(app)?;
                let applications = if user.user_type == UserType::Organizer {
                    pages.organizer_dashboard().await.context("Failed to load applications")?.1
                } else {
                    pages.staff_applications().await.context("Failed to load applications")?
                };
                print_applications(&applications, user.user_type);
            }
            ApplicationCommands::Accept { id } => {
                actions.set_application_status(id, ApplicationAction::Accept).await?;
            }
            ApplicationCommands::Reject { id } => {
                actions.set_application_status(id, ApplicationAction::Reject).await?;
            }
            ApplicationCommands::Withdraw { id } => {
                actions.set_application_status(id, ApplicationAction::Withdraw).await?;
            }
            ApplicationCommands::Pay { id } => {
                actions.release_payment(id).await?;
            }
        },

        Commands::Bookings => {
            if !app.session.enter(Page::StaffPortal, navigator) {
                return Ok(());
            }
            let applications = pages.bookings().await.context("Failed to load bookings")?;
            let today = Utc::now().date_naive();
            let (upcoming, completed): (Vec<&Application>, Vec<&Application>) = applications
                .iter()
                .filter(|a| a.status == ApplicationStatus::Accepted)
                .partition(|a| a.job.event_date().is_none_or(|date| date >= today));
            println!("Upcoming ({})", upcoming.len());
            print_bookings(&upcoming);
            println!("\nCompleted ({})", completed.len());
            print_bookings(&completed);
        }

        Commands::Dashboard => {
            let user = signed_in(app)?;
            let today = Utc::now().date_naive();
            match app.enter_dashboard().await.context("Failed to load dashboard")? {
                Dashboard::Organizer { jobs, applications } => {
                    let stats = OrganizerStats::from_jobs(&jobs, &applications, today);
                    println!("Active jobs:      {}", stats.active_jobs);
                    println!("Hired staff:      {}", stats.hired_staff);
                    println!("Upcoming events:  {}", stats.upcoming_events);
                    println!("Total spent:      ₹{}", format_inr(&stats.total_spent.to_string()));
                }
                Dashboard::Staff { applications } => {
                    let stats = StaffStats::from_applications(&applications, Some(&user), today);
                    println!("Events completed: {}", stats.events_completed);
                    println!("Total earned:     ₹{}", format_inr(&stats.total_earned.to_string()));
                    println!("Rating:           {:.1}", stats.rating);
                    println!("Upcoming:         {}", stats.upcoming);
                }
            }
            if app.verification.is_active() {
                println!("\nVerification pending. Run `eventflex verify watch` to follow the review.");
            }
        }

        Commands::Wallet => {
            if !app.session.enter(Page::Wallet, navigator) {
                return Ok(());
            }
            let stats = pages.wallet_stats().await.context("Failed to load wallet")?;
            println!("Available balance: ₹{}", format_inr(&stats.available_balance));
            println!(
                "Pending:           ₹{} ({} payments)",
                format_inr(&stats.pending_amount),
                stats.pending_count
            );
            println!(
                "Total earned:      ₹{} over {} events",
                format_inr(&stats.total_earned),
                stats.total_events
            );

            let transactions = pages.transactions().await.context("Failed to load transactions")?;
            println!();
            if transactions.is_empty() {
                println!("No transactions found.");
            } else {
                println!("{:<12} {:<28} {:<18} {:>10} {:<8}", "DATE", "EVENT", "ORGANIZER", "AMOUNT", "STATUS");
                println!("{}", "-".repeat(80));
                for tx in transactions {
                    let event = if tx.event_title.is_empty() { "Payment" } else { tx.event_title.as_str() };
                    let organizer = if tx.organizer_name.is_empty() { "-" } else { tx.organizer_name.as_str() };
                    let status = if tx.status == "completed" { "Paid" } else { "Pending" };
                    println!(
                        "{:<12} {:<28} {:<18} {:>10} {:<8}",
                        format_date(tx.created_at.as_deref()),
                        truncate(event, 26),
                        truncate(organizer, 16),
                        format!("₹{}", format_inr(&tx.amount)),
                        status,
                    );
                }
            }
        }

        Commands::Withdraw { amount } => {
            actions.withdraw(&amount).await?;
        }

        Commands::AddFunds { amount } => {
            actions.add_funds(&amount).await?;
        }

        Commands::Bank { command } => match command.unwrap_or(BankCommands::Show) {
            BankCommands::Show => {
                let details = actions.load_bank_details().await?;
                if details.is_complete() {
                    println!("Account holder: {}", details.account_holder);
                    println!("Account number: {}", mask_account_number(&details.account_number));
                    println!("IFSC:           {}", details.ifsc_code);
                    if !details.bank_name.is_empty() {
                        println!("Bank:           {}", details.bank_name);
                    }
                    if !details.branch.is_empty() {
                        println!("Branch:         {}", details.branch);
                    }
                } else {
                    println!("No bank account on file. Add one with `eventflex bank set`.");
                }
            }
            BankCommands::Set {
                holder,
                account_number,
                ifsc,
                bank_name,
                branch,
            } => {
                actions
                    .update_bank_details(BankDetails {
                        account_holder: holder,
                        account_number,
                        ifsc_code: ifsc,
                        bank_name,
                        branch,
                    })
                    .await?;
            }
        },

        Commands::Messages { partner, watch } => {
            if !app.session.enter(Page::Messages, navigator) {
                return Ok(());
            }
            match partner {
                None => {
                    let conversations = pages
                        .conversations(None)
                        .await
                        .context("Failed to load conversations")?;
                    if conversations.is_empty() {
                        println!("No conversations yet.");
                    } else {
                        let now = Utc::now();
                        println!("{:<6} {:<22} {:>7} {:<40} {:<10}", "ID", "WITH", "UNREAD", "LAST MESSAGE", "WHEN");
                        println!("{}", "-".repeat(89));
                        for conv in conversations {
                            println!(
                                "{:<6} {:<22} {:>7} {:<40} {:<10}",
                                conv.partner.id.unwrap_or_default(),
                                truncate(&conv.partner.display_name(), 20),
                                conv.unread,
                                truncate(&conv.last_message, 38),
                                time_ago(conv.last_at.as_deref(), now),
                            );
                        }
                    }
                }
                Some(partner_id) => {
                    actions.select_conversation(Some(partner_id)).await?;
                    let mut seen = print_new_messages(app, 0);
                    if watch {
                        watch_chat(app, toasts, &mut seen).await;
                    }
                    app.chat.stop();
                }
            }
        }

        Commands::Send { to, text } => {
            actions.select_conversation(Some(to)).await?;
            let result = actions.send_message(&text).await;
            app.chat.stop();
            result?;
        }

        Commands::Verify { command } => match command.unwrap_or(VerifyCommands::Status) {
            VerifyCommands::Status => {
                let status = pages
                    .verification_banner()
                    .await
                    .context("Failed to load verification status")?;
                let state = if status.is_verified() {
                    "verified".to_string()
                } else {
                    status.status.clone().unwrap_or_else(|| "not submitted".to_string())
                };
                println!("KYC:    {}", state);
                println!("Video:  {}", if status.video_verified { "verified" } else { "not verified" });
                if let Some(submitted) = &status.submitted_at {
                    println!("Submitted: {}", format_date(Some(submitted)));
                }
                if let Some(reason) = &status.rejection_reason {
                    println!("Reason: {}", reason);
                }
            }
            VerifyCommands::Submit {
                document_type,
                document,
                video,
            } => {
                let document = read_upload(&document).await?;
                let video = match video {
                    Some(path) => Some(read_upload(&path).await?),
                    None => None,
                };
                actions
                    .submit_verification(&document_type, Some(document), video)
                    .await?;
            }
            VerifyCommands::Watch => {
                signed_in(app)?;
                if !app.verification.start_if_needed() {
                    println!("Already verified.");
                    return Ok(());
                }
                println!("Waiting for verification review (Ctrl-C to stop)...");
                watch_verification(app, toasts).await;
            }
        },

        Commands::Profile { command } => match command.unwrap_or(ProfileCommands::Show { id: None }) {
            ProfileCommands::Show { id: None } => {
                let user = signed_in(app)?;
                let fresh = app.session.refresh_from_server(&app.api).await.unwrap_or(user);
                print_profile(&fresh);
            }
            ProfileCommands::Show { id: Some(id) } => {
                let profile = actions.view_profile(id).await?;
                print_profile(&profile);
            }
            ProfileCommands::Update {
                first_name,
                last_name,
                email,
                phone,
                city,
                bio,
                expected_pay,
            } => {
                let user = actions
                    .update_profile(ProfileUpdate {
                        first_name,
                        last_name,
                        email,
                        phone,
                        city,
                        bio,
                        expected_pay,
                    })
                    .await?;
                print_profile(&user);
            }
            ProfileCommands::Photo { path } => {
                actions.upload_photo(read_upload(&path).await?).await?;
            }
            ProfileCommands::Video { path } => {
                actions.upload_video(read_upload(&path).await?).await?;
            }
        },
    }

    Ok(())
}

fn signed_in(app: &App) -> Result<UserSession> {
    app.session
        .get()
        .ok_or_else(|| anyhow!("Not signed in. Run `eventflex login <username>` first."))
}

async fn read_upload(path: &Path) -> Result<Upload> {
    Upload::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

fn print_toast(toast: &Toast) {
    eprintln!("[{}] {}", toast.variant, toast.message);
}

fn drain_toasts(toasts: &mut broadcast::Receiver<Toast>) {
    loop {
        match toasts.try_recv() {
            Ok(toast) => print_toast(&toast),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

/// Prints rendered chat messages with an id above `after`; returns the highest id seen.
fn print_new_messages(app: &App, after: i64) -> i64 {
    let markup = app.surface.content(slot::CHAT_MESSAGES).unwrap_or_default();
    let document = Html::parse_fragment(&markup);
    let (Ok(message), Ok(sender), Ok(content), Ok(time)) = (
        Selector::parse(".message"),
        Selector::parse(".message-sender"),
        Selector::parse(".message-content"),
        Selector::parse(".message-time"),
    ) else {
        return after;
    };
    let text = |el: scraper::ElementRef<'_>, sel: &Selector| {
        el.select(sel)
            .next()
            .map(|e| e.text().collect::<String>())
            .unwrap_or_default()
    };

    let mut last = after;
    for el in document.select(&message) {
        let id: i64 = el
            .value()
            .attr("data-message-id")
            .and_then(|id| id.parse().ok())
            .unwrap_or_default();
        if id <= after {
            continue;
        }
        println!("[{}] {}:", text(el, &time), text(el, &sender));
        for line in textwrap::fill(&text(el, &content), 76).lines() {
            println!("    {}", line);
        }
        last = last.max(id);
    }
    last
}

async fn watch_chat(app: &App, toasts: &mut broadcast::Receiver<Toast>, seen: &mut i64) {
    let mut tick = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            toast = toasts.recv() => {
                if let Ok(toast) = toast {
                    print_toast(&toast);
                }
            }
            _ = tick.tick() => {
                *seen = print_new_messages(app, *seen);
                if !app.chat.is_active() {
                    break;
                }
            }
        }
    }
}

async fn watch_verification(app: &App, toasts: &mut broadcast::Receiver<Toast>) {
    let mut tick = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            toast = toasts.recv() => {
                if let Ok(toast) = toast {
                    print_toast(&toast);
                }
            }
            _ = tick.tick() => {
                if !app.verification.is_active() {
                    break;
                }
            }
        }
    }
}

fn print_applications(applications: &[Application], viewer: UserType) {
    if applications.is_empty() {
        println!("No applications found.");
        return;
    }
    let now = Utc::now();
    let who = if viewer == UserType::Organizer { "APPLICANT" } else { "ORGANIZER" };
    println!("{:<6} {:<14} {:<28} {:<20} {:<12}", "ID", "STATUS", "JOB", who, "APPLIED");
    println!("{}", "-".repeat(84));
    for app in applications {
        let counterpart = if viewer == UserType::Organizer {
            app.applicant.as_ref()
        } else {
            app.job.organizer.as_ref()
        };
        let status = match app.status {
            ApplicationStatus::Pending => "Under Review",
            ApplicationStatus::Accepted => "Accepted",
            _ => "Closed",
        };
        println!(
            "{:<6} {:<14} {:<28} {:<20} {:<12}",
            app.id,
            status,
            truncate(&app.job.title, 26),
            truncate(&counterpart.map(|p| p.display_name()).unwrap_or_default(), 18),
            time_ago(app.created_at.as_deref(), now),
        );
    }
}

fn print_bookings(bookings: &[&Application]) {
    if bookings.is_empty() {
        println!("  (none)");
        return;
    }
    for app in bookings {
        println!(
            "  #{:<5} {:<12} {:<28} {:<18} ₹{}",
            app.id,
            format_date(app.job.date.as_deref()),
            truncate(&app.job.title, 26),
            truncate(&app.job.location, 16),
            format_inr(&app.job.pay_rate),
        );
    }
}

fn print_profile(profile: &Profile) {
    println!("{} (@{})", profile.display_name(), profile.username);
    if let Some(id) = profile.id {
        println!("ID: {}", id);
    }
    println!("Type: {}", profile.user_type.as_str());
    if !profile.email.is_empty() {
        println!("Email: {}", profile.email);
    }
    if !profile.phone.is_empty() {
        println!("Phone: {}", profile.phone);
    }
    if !profile.city.is_empty() {
        println!("City: {}", profile.city);
    }
    println!(
        "KYC: {}  Video: {}",
        if profile.kyc_verified { "verified" } else { "pending" },
        if profile.video_verified { "verified" } else { "pending" },
    );
    if let Some(badge) = profile.badge {
        println!("Badge: {}", badge.label());
    }
    if profile.total_reviews > 0 {
        println!("Rating: {:.1} ({} reviews)", profile.average_rating, profile.total_reviews);
    }
    if profile.total_events_completed > 0 {
        println!("Events completed: {}", profile.total_events_completed);
    }
    if let Some(pay) = &profile.expected_pay {
        println!("Expected pay: ₹{}/day", format_inr(pay));
    }
    if !profile.bio.trim().is_empty() {
        println!();
        for line in textwrap::fill(&profile.bio, 70).lines() {
            println!("  {}", line);
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
