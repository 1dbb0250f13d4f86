use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use clinic_core::{
    validation, AppointmentService, AppointmentView, AuthService,
    BillingService, ClinicResult, CoreConfig, InventoryService, NewUser, PatientSearch,
    PatientService, ReportService, StatusFilter, UserService, UserUpdate,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "clinic")]
#[command(about = "Clinic management CLI")]
struct Cli {
    /// Directory holding the collection files
    #[arg(long, global = true, env = "CLINIC_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check credentials and print the role
    Login { username: String, password: String },
    /// Patient records
    #[command(subcommand)]
    Patient(PatientCommand),
    /// Appointment scheduling and consultations
    #[command(subcommand)]
    Appointment(AppointmentCommand),
    /// Medicine inventory and dispensing
    #[command(subcommand)]
    Medicine(MedicineCommand),
    /// Billing and income
    #[command(subcommand)]
    Bill(BillCommand),
    /// User accounts
    #[command(subcommand)]
    User(UserCommand),
    /// Administrator reports
    #[command(subcommand)]
    Report(ReportCommand),
}

#[derive(Subcommand)]
enum PatientCommand {
    /// Register a new patient
    Register { name: String, dob: String, phone: String },
    /// Replace a patient's name, date of birth and phone
    Update {
        patient_id: String,
        name: String,
        dob: String,
        phone: String,
    },
    /// Search patients by name
    Search { query: String },
    /// List all patients
    List,
}

#[derive(Subcommand)]
enum AppointmentCommand {
    /// Book an appointment (date after today, time HH:MM)
    Schedule {
        patient_id: String,
        doctor_id: String,
        date: String,
        time: String,
    },
    /// Move a booked appointment
    Reschedule {
        apt_id: String,
        date: String,
        time: String,
        /// Replacement doctor ID
        #[arg(long)]
        doctor: Option<String>,
    },
    /// Cancel an appointment
    Cancel { apt_id: String },
    /// Record a consultation
    Consult {
        apt_id: String,
        /// Comma-separated medicine IDs, e.g. M1,M2
        medicine: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Show the prescription and note of a consulted appointment
    Summary { apt_id: String },
    /// Assign doctors to today's appointments that have none
    AutoAssign,
    /// List appointments
    List {
        /// Only this date
        #[arg(long)]
        date: Option<String>,
        /// Only this patient
        #[arg(long)]
        patient: Option<String>,
        /// Only this doctor
        #[arg(long)]
        doctor: Option<String>,
    },
}

#[derive(Subcommand)]
enum MedicineCommand {
    /// Add a medicine
    Add { name: String, stock: u32, price: f64 },
    /// Set the stock count
    Stock { med_id: String, stock: u32 },
    /// Set the price
    Price { med_id: String, price: f64 },
    /// Remove a medicine
    Remove { med_id: String },
    /// List all medicines
    List,
    /// Medicines at or below the alert limit
    LowStock,
    /// Medicines prescribed on an appointment
    Prescribed { apt_id: String },
    /// Dispense a paid appointment and complete it
    Dispense { apt_id: String },
}

#[derive(Subcommand)]
enum BillCommand {
    /// Compute a bill without recording it
    Quote { apt_id: String, consultation_fee: f64 },
    /// Record a bill and append its receipt
    Record { apt_id: String, consultation_fee: f64 },
    /// List unpaid bills
    Unpaid,
    /// Paid, outstanding and total income
    Summary,
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add a user account
    Add {
        username: String,
        password: String,
        age: String,
        phone: String,
        /// Role or code: d, r, ph, a, ad, p
        role: String,
    },
    /// Update a user found by username or ID
    Update {
        key: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        age: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Remove a user found by username or ID
    Remove { key: String },
    /// List all users
    List,
    /// List doctors
    Doctors,
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Booked and cancelled counts for the next seven days
    Upcoming,
    /// Appointments on one day
    Day {
        date: String,
        /// booked, cancelled or all
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Every appointment
    History,
    /// Paid bills with patient names
    Income,
    /// Staff accounts
    Staff,
    /// Medicine stock and low-stock list
    Medicines,
}

fn print_views(views: &[AppointmentView]) {
    if views.is_empty() {
        println!("No appointments found.");
    }
    for v in views {
        let a = &v.appointment;
        println!(
            "{} | {} {} | patient {} ({}) | doctor {} ({}) | {}",
            a.apt_id, a.date, a.time, a.patient_id, v.patient_name, a.doctor_id, v.doctor_name, a.status
        );
    }
}

fn parse_day(input: &str) -> ClinicResult<NaiveDate> {
    validation::parse_date(input)
}

fn run(command: Commands, cfg: Arc<CoreConfig>, today: NaiveDate) -> ClinicResult<()> {
    match command {
        Commands::Login { username, password } => {
            let session = AuthService::new(cfg).authenticate(&username, &password)?;
            println!("Login successful: {} ({})", session.username(), session.role());
        }
        Commands::Patient(cmd) => {
            let service = PatientService::new(cfg);
            match cmd {
                PatientCommand::Register { name, dob, phone } => {
                    let p = service.register(&name, &dob, &phone, today)?;
                    println!("Registered patient {}: {} (age {})", p.patient_id, p.name, p.age);
                }
                PatientCommand::Update {
                    patient_id,
                    name,
                    dob,
                    phone,
                } => {
                    let p = service.update_info(&patient_id, &name, &dob, &phone, today)?;
                    println!("Updated patient {}: {} (age {})", p.patient_id, p.name, p.age);
                }
                PatientCommand::Search { query } => {
                    let result = service.search_by_name(&query)?;
                    if result == PatientSearch::NoMatch {
                        println!("No close matches.");
                    }
                    for p in result.patients() {
                        println!("{} | {} | {} | {}", p.patient_id, p.name, p.dob, p.phone);
                    }
                }
                PatientCommand::List => {
                    for p in service.list()? {
                        println!("{} | {} | {} | age {} | {}", p.patient_id, p.name, p.dob, p.age, p.phone);
                    }
                }
            }
        }
        Commands::Appointment(cmd) => {
            let service = AppointmentService::new(cfg);
            match cmd {
                AppointmentCommand::Schedule {
                    patient_id,
                    doctor_id,
                    date,
                    time,
                } => {
                    let a = service.schedule(&patient_id, &doctor_id, &date, &time, today)?;
                    println!("Appointment {} booked for {} {}", a.apt_id, a.date, a.time);
                }
                AppointmentCommand::Reschedule {
                    apt_id,
                    date,
                    time,
                    doctor,
                } => {
                    let a = service.reschedule(&apt_id, &date, &time, doctor.as_deref(), today)?;
                    println!("Appointment {} moved to {} {}", a.apt_id, a.date, a.time);
                }
                AppointmentCommand::Cancel { apt_id } => {
                    let a = service.cancel(&apt_id)?;
                    println!("Appointment {} cancelled", a.apt_id);
                }
                AppointmentCommand::Consult {
                    apt_id,
                    medicine,
                    note,
                } => {
                    let a = service.consult(&apt_id, &medicine, &note)?;
                    println!(
                        "Appointment {} consulted, prescribed {}",
                        a.apt_id,
                        a.medicine.unwrap_or_default()
                    );
                }
                AppointmentCommand::Summary { apt_id } => {
                    let s = service.consultation_summary(&apt_id)?;
                    println!("{} | medicine: {} | note: {}", s.apt_id, s.medicine, s.note);
                }
                AppointmentCommand::AutoAssign => {
                    let assigned = service.auto_assign_doctors(today)?;
                    println!("Assigned doctors to {} appointment(s)", assigned.len());
                }
                AppointmentCommand::List {
                    date,
                    patient,
                    doctor,
                } => {
                    let date = date.as_deref().map(parse_day).transpose()?;
                    let views = match (patient, doctor, date) {
                        (Some(patient), _, _) => service.for_patient(&patient)?,
                        (None, Some(doctor), date) => service.for_doctor(&doctor, date)?,
                        (None, None, Some(date)) => service.for_date(date)?,
                        (None, None, None) => service.all()?,
                    };
                    print_views(&views);
                }
            }
        }
        Commands::Medicine(cmd) => {
            let service = InventoryService::new(cfg);
            match cmd {
                MedicineCommand::Add { name, stock, price } => {
                    let m = service.add(&name, stock, price)?;
                    println!("Added medicine {}: {}", m.med_id, m.name);
                }
                MedicineCommand::Stock { med_id, stock } => {
                    let m = service.update_stock(&med_id, stock)?;
                    println!("{} stock -> {}", m.med_id, m.stock);
                }
                MedicineCommand::Price { med_id, price } => {
                    let m = service.update_price(&med_id, price)?;
                    println!("{} price -> RM {:.2}", m.med_id, m.price);
                }
                MedicineCommand::Remove { med_id } => {
                    let m = service.remove(&med_id)?;
                    println!("Removed medicine {}: {}", m.med_id, m.name);
                }
                MedicineCommand::List => {
                    for m in service.list()? {
                        println!("{} | {} | stock {} | RM {:.2}", m.med_id, m.name, m.stock, m.price);
                    }
                }
                MedicineCommand::LowStock => {
                    let low = service.low_stock()?;
                    if low.is_empty() {
                        println!("All medicines have sufficient stock.");
                    }
                    for m in low {
                        println!("{} | {} -> ONLY {} LEFT", m.med_id, m.name, m.stock);
                    }
                }
                MedicineCommand::Prescribed { apt_id } => {
                    for item in service.medication_list(&apt_id)? {
                        match item.medicine {
                            Some(m) => println!("{} | {} | stock {} | RM {:.2}", m.med_id, m.name, m.stock, m.price),
                            None => println!("{} | not found in inventory", item.med_id),
                        }
                    }
                }
                MedicineCommand::Dispense { apt_id } => {
                    let report = service.dispense(&apt_id)?;
                    for change in &report.changes {
                        if change.shortfall {
                            println!("Warning: stock for {} is insufficient!", change.name);
                        }
                        println!("{} stock -> {}", change.name, change.remaining);
                    }
                    for missing in &report.missing {
                        println!("{} not found in inventory", missing);
                    }
                    println!("Appointment {} completed", report.appointment.apt_id);
                }
            }
        }
        Commands::Bill(cmd) => {
            let service = BillingService::new(cfg);
            match cmd {
                BillCommand::Quote {
                    apt_id,
                    consultation_fee,
                } => {
                    let q = service.quote(&apt_id, consultation_fee)?;
                    println!("Consultation Fee : RM {:.2}", q.consultation_fee);
                    println!("Medicine Fee     : RM {:.2}", q.medicine_fee);
                    println!("Total Amount     : RM {:.2}", q.total);
                }
                BillCommand::Record {
                    apt_id,
                    consultation_fee,
                } => {
                    let outcome =
                        service.record(&apt_id, consultation_fee, Local::now().naive_local())?;
                    print!("{}", outcome.receipt);
                }
                BillCommand::Unpaid => {
                    let unpaid = service.unpaid()?;
                    if unpaid.is_empty() {
                        println!("No unpaid bills.");
                    }
                    for b in unpaid {
                        println!("{} | {} | RM {:.2}", b.bill_id, b.patient, b.amount);
                    }
                }
                BillCommand::Summary => {
                    let s = service.income_summary()?;
                    println!("Paid Total     : RM {:.2}", s.paid_total);
                    println!("Outstanding    : RM {:.2}", s.outstanding);
                    println!("Total Revenue  : RM {:.2}", s.total_revenue);
                }
            }
        }
        Commands::User(cmd) => {
            let service = UserService::new(cfg);
            match cmd {
                UserCommand::Add {
                    username,
                    password,
                    age,
                    phone,
                    role,
                } => {
                    let u = service.add(NewUser {
                        username,
                        password,
                        age: validation::user_age(&age)?,
                        role: validation::role(&role)?,
                        phone,
                    })?;
                    println!("Added user {}: {} ({})", u.user_id, u.username, u.role);
                }
                UserCommand::Update {
                    key,
                    username,
                    password,
                    age,
                    phone,
                    role,
                } => {
                    let changes = UserUpdate {
                        username,
                        password,
                        age: age.as_deref().map(validation::user_age).transpose()?,
                        phone,
                        role: role.as_deref().map(validation::role).transpose()?,
                    };
                    let u = service.update(&key, changes)?;
                    println!("Updated user {}: {} ({})", u.user_id, u.username, u.role);
                }
                UserCommand::Remove { key } => match service.remove(&key) {
                    Ok(u) => println!("Removed user {}: {}", u.user_id, u.username),
                    Err(e) => {
                        for s in service.suggestions(&key)? {
                            eprintln!("Did you mean: {} (Phone: {})", s.username, s.phone);
                        }
                        return Err(e);
                    }
                },
                UserCommand::List => {
                    for u in service.list()? {
                        println!("{} | {} | {} | {}", u.user_id, u.username, u.role, u.status);
                    }
                }
                UserCommand::Doctors => {
                    for d in service.doctors()? {
                        println!("{} | {} | {}", d.doctor_id, d.name, d.phone);
                    }
                }
            }
        }
        Commands::Report(cmd) => {
            let service = ReportService::new(cfg);
            match cmd {
                ReportCommand::Upcoming => {
                    for day in service.upcoming_overview(today)? {
                        println!(
                            "{} | booked {} | cancelled {} | total {}",
                            day.date, day.booked, day.cancelled, day.total
                        );
                    }
                }
                ReportCommand::Day { date, status } => {
                    let filter = match status.trim().to_lowercase().as_str() {
                        "b" | "booked" => StatusFilter::Booked,
                        "c" | "cancelled" => StatusFilter::Cancelled,
                        _ => StatusFilter::All,
                    };
                    print_views(&service.appointments_on(parse_day(&date)?, filter)?);
                }
                ReportCommand::History => print_views(&service.appointment_history()?),
                ReportCommand::Income => {
                    for line in service.income_details()? {
                        println!(
                            "{} | {} {} | RM {:.2} | {}",
                            line.bill_id, line.patient_id, line.patient_name, line.amount, line.date
                        );
                    }
                }
                ReportCommand::Staff => {
                    let staff = service.staff_summary()?;
                    println!("Total Staff: {}", staff.len());
                    for u in staff {
                        println!("{} | {} | {}", u.user_id, u.username, u.role);
                    }
                }
                ReportCommand::Medicines => {
                    let summary = service.medicine_summary()?;
                    println!("Total Medicine Items: {}", summary.medicines.len());
                    println!("Low stock (stock < {}):", summary.limit);
                    for m in summary.low_stock {
                        println!("{} | {} | {}", m.med_id, m.name, m.stock);
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("clinic=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let env_cfg = CoreConfig::resolve(|key| std::env::var(key).ok())?;
    let cfg = match cli.data_dir {
        Some(dir) => CoreConfig::new(dir, env_cfg.billing_mode())?
            .with_stock_limits(env_cfg.low_stock_limit(), env_cfg.summary_low_stock_limit()),
        None => env_cfg,
    };

    let Some(command) = cli.command else {
        println!("No command provided. Use --help for more information.");
        return Ok(());
    };

    if let Err(e) = run(command, Arc::new(cfg), Local::now().date_naive()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
