/// Upper bound on `INTERVAL` for each supported frequency.
pub const MAX_DAILY_INTERVAL: u32 = 15;
pub const MAX_WEEKLY_INTERVAL: u32 = 12;
pub const MAX_MONTHLY_INTERVAL: u32 = 3;

pub const DEFAULT_REPEAT_SPAN_DAYS: u16 = 7;
pub const MAX_REPEAT_SPAN_DAYS: u16 = 366;

/// Recurrence text property names (RFC 5545 §3.8.2.4, §3.8.5.3).
pub const DTSTART_PROPERTY: &str = "DTSTART";
pub const RRULE_PROPERTY: &str = "RRULE";
pub const RRULE_LINE_PREFIX: &str = const_str::concat!(RRULE_PROPERTY, ":");

/// Label used for availability that spans a whole calendar day.
pub const WHOLE_DAY_LABEL: &str = "Whole day";
