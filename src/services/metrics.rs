use lazy_static::lazy_static;
use prometheus::{register_counter_vec, CounterVec};

lazy_static! {
    pub static ref AVAILABILITY_UPDATES_COUNTER: CounterVec = register_counter_vec!(
        "availability_updates_total",
        "Availability answers recorded, by academy and status",
        &["academy", "status"]
    ).unwrap();

    pub static ref AVAILABILITY_DENIED_COUNTER: CounterVec = register_counter_vec!(
        "availability_denied_total",
        "Availability writes refused by the authorization guard",
        &["academy", "reason"]
    ).unwrap();

    pub static ref SESSIONS_CREATED_COUNTER: CounterVec = register_counter_vec!(
        "sessions_created_total",
        "Training sessions scheduled, by academy",
        &["academy"]
    ).unwrap();
}
