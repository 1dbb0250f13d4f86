//! # Clinic Core
//!
//! Business logic for the clinic management console.
//!
//! This crate holds the typed entities and every role operation:
//! - appointment scheduling with doctor and patient conflict checks
//! - the appointment status lifecycle (`booked → consulted → paid → completed`)
//! - inventory and dispensing, billing and receipts
//! - patient registration, user administration, login and reports
//!
//! Persistence is delegated to `clinic-store`; nothing here touches files directly
//! except through it.
//!
//! **No presentation concerns**: menus, prompts and table rendering belong in the
//! console and CLI binaries.

pub mod config;
pub mod conflict;
pub mod constants;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod services;
pub mod validation;

pub use config::{BillingMode, CoreConfig};
pub use conflict::{Availability, ConflictChecker};
pub use error::{ClinicError, ClinicResult, ConflictRule, EntityKind};
pub use lifecycle::LifecycleAction;
pub use models::{Appointment, AppointmentStatus, Bill, BillStatus, Medicine, Patient, Role, User};
pub use services::appointments::{AppointmentService, AppointmentView, ConsultationSummary};
pub use services::auth::{AuthService, LoginGate, LoginOutcome, Session};
pub use services::billing::{BillLine, BillQuote, BillingOutcome, BillingService, IncomeSummary};
pub use services::inventory::{DispenseReport, InventoryService, PrescribedMedicine, StockChange};
pub use services::patients::{PatientSearch, PatientService};
pub use services::reports::{DayOverview, IncomeLine, MedicineSummary, ReportService, StatusFilter};
pub use services::users::{Doctor, NewUser, UserService, UserUpdate};

pub use clinic_store::{Collection, RecordStore};
