/// Decimal precision for stored monetary amounts
pub const MONEY_DECIMAL_PRECISION: u32 = 2;

/// Points granted per whole unit of currency donated
pub const POINTS_PER_CURRENCY_UNIT: i64 = 1;

/// Months before donation-earned points expire
pub const EARNED_POINTS_VALIDITY_MONTHS: u32 = 12;

/// Upper bound on the outbound payment gateway call
pub const GATEWAY_TIMEOUT_SECS: u64 = 30;

/// Prefix for generated redemption codes
pub const REDEMPTION_CODE_PREFIX: &str = "RDM";
