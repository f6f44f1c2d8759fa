mod projector;
mod views;

pub use projector::{
    first_due_date, project_installments, split_amount, Installment, RemainderPolicy, Split,
};
pub use views::{
    due_in, person_schedule, person_totals, project_all, total_owed, total_scheduled,
    PersonTotals, TrackedInstallment,
};
