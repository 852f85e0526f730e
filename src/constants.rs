//! Application constants for the outage/temperature pipeline
//!
//! Raw and canonical column names, the default state reference list,
//! filter sets and numeric defaults used throughout the crate.

// =============================================================================
// Event Source Layout
// =============================================================================

/// Banner rows above the header row in the outage spreadsheet export
pub const EVENT_BANNER_ROWS: usize = 5;

/// Units-annotation rows directly below the header row
pub const EVENT_UNITS_ROWS: usize = 1;

/// Raw width of the outage spreadsheet (leading "variables" column + 55 variables)
pub const EVENT_RAW_COLUMN_COUNT: usize = 56;

/// Text form of the assembled outage timestamps in CSV output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Raw event columns and their canonical names
pub mod event_columns {
    pub const OBS: (&str, &str) = ("OBS", "obs_id");
    pub const YEAR: (&str, &str) = ("YEAR", "year");
    pub const MONTH: (&str, &str) = ("MONTH", "month");
    pub const STATE: (&str, &str) = ("U.S._STATE", "state");
    pub const POSTAL_CODE: (&str, &str) = ("POSTAL.CODE", "postal_code");
    pub const NERC_REGION: (&str, &str) = ("NERC.REGION", "nerc_region");
    pub const CLIMATE_REGION: (&str, &str) = ("CLIMATE.REGION", "climate_region");
    pub const ANOMALY_LEVEL: (&str, &str) = ("ANOMALY.LEVEL", "anomaly_level");
    pub const CLIMATE_CATEGORY: (&str, &str) = ("CLIMATE.CATEGORY", "climate_category");
    pub const START_DATE: &str = "OUTAGE.START.DATE";
    pub const START_TIME: &str = "OUTAGE.START.TIME";
    pub const RESTORATION_DATE: &str = "OUTAGE.RESTORATION.DATE";
    pub const RESTORATION_TIME: &str = "OUTAGE.RESTORATION.TIME";
    pub const CAUSE_CATEGORY: (&str, &str) = ("CAUSE.CATEGORY", "cause_category");
    pub const CAUSE_DETAIL: (&str, &str) = ("CAUSE.CATEGORY.DETAIL", "cause_detail");
    pub const HURRICANE_NAMES: (&str, &str) = ("HURRICANE.NAMES", "hurricane_names");
    pub const DURATION: (&str, &str) = ("OUTAGE.DURATION", "outage_duration_minutes");
    pub const DEMAND_LOSS: (&str, &str) = ("DEMAND.LOSS.MW", "demand_loss_mw");
    pub const CUSTOMERS_AFFECTED: (&str, &str) = ("CUSTOMERS.AFFECTED", "customers_affected");
}

// =============================================================================
// Canonical Columns
// =============================================================================

pub mod columns {
    pub const OBS_ID: &str = "obs_id";
    pub const YEAR: &str = "year";
    pub const MONTH: &str = "month";
    pub const STATE: &str = "state";
    pub const OUTAGE_START: &str = "outage_start";
    pub const OUTAGE_RESTORATION: &str = "outage_restoration";
    pub const CAUSE_CATEGORY: &str = "cause_category";
    pub const CAUSE_DETAIL: &str = "cause_detail";
    pub const OUTAGE_DURATION: &str = "outage_duration_minutes";
    pub const AVG_TEMP_F: &str = "avg_temp_f";
    pub const TEMP_CATEGORY: &str = "temp_category";
    pub const IS_HOT: &str = "is_hot";

    /// Encoded identifier column of the wide temperature table
    pub const TEMPERATURE_CODE: &str = "code";

    /// Month columns of the wide temperature table, January first
    pub const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];

    /// Final analysis table, in output order
    pub const OUTPUT: &[&str] = &[
        "obs_id",
        "year",
        "month",
        "state",
        "postal_code",
        "nerc_region",
        "climate_region",
        "anomaly_level",
        "climate_category",
        "outage_start",
        "outage_restoration",
        "cause_category",
        "cause_detail",
        "hurricane_names",
        "outage_duration_minutes",
        "demand_loss_mw",
        "customers_affected",
        "avg_temp_f",
        "temp_category",
        "is_hot",
    ];
}

// =============================================================================
// Temperature Source Layout
// =============================================================================

/// Cells per decoded temperature line: identifier + 12 months
pub const TEMPERATURE_CELLS: usize = 13;

/// Width of the identifier field in the NOAA fixed-width layout
pub const FIXED_WIDTH_CODE_CHARS: usize = 10;

/// Width of each monthly value field in the NOAA fixed-width layout
pub const FIXED_WIDTH_VALUE_CHARS: usize = 7;

/// NOAA climate-division missing value marker
pub const NOAA_MISSING_VALUE: f64 = -99.90;

/// Trailing digits of the encoded identifier that hold the year
pub const YEAR_DIGITS: usize = 4;

/// First year covered by the outage records
pub const DEFAULT_MIN_YEAR: i32 = 2000;

/// The 48 contiguous U.S. states in NOAA state-code order
/// (alphabetical, Alaska and Hawaii excluded)
pub const CONTIGUOUS_STATES: [&str; 48] = [
    "Alabama",
    "Arizona",
    "Arkansas",
    "California",
    "Colorado",
    "Connecticut",
    "Delaware",
    "Florida",
    "Georgia",
    "Idaho",
    "Illinois",
    "Indiana",
    "Iowa",
    "Kansas",
    "Kentucky",
    "Louisiana",
    "Maine",
    "Maryland",
    "Massachusetts",
    "Michigan",
    "Minnesota",
    "Mississippi",
    "Missouri",
    "Montana",
    "Nebraska",
    "Nevada",
    "New Hampshire",
    "New Jersey",
    "New Mexico",
    "New York",
    "North Carolina",
    "North Dakota",
    "Ohio",
    "Oklahoma",
    "Oregon",
    "Pennsylvania",
    "Rhode Island",
    "South Carolina",
    "South Dakota",
    "Tennessee",
    "Texas",
    "Utah",
    "Vermont",
    "Virginia",
    "Washington",
    "West Virginia",
    "Wisconsin",
    "Wyoming",
];

// =============================================================================
// Feature and Filter Defaults
// =============================================================================

/// Average temperatures at or below this are "cold" (°F)
pub const COLD_MAX_F: f64 = 40.0;

/// Average temperatures at or above this are "hot" (°F)
pub const HOT_MIN_F: f64 = 80.0;

/// Longest outage kept in the analysis table (minutes)
pub const MAX_OUTAGE_DURATION_MINUTES: f64 = 30_000.0;

/// Cause details excluded from the analysis table
pub const EXCLUDED_CAUSE_DETAILS: &[&str] = &[
    "snow/ice storm",
    "hurricanes",
    "earthquake",
    "computer hardware",
];

/// Cause categories excluded from the analysis table
pub const EXCLUDED_CAUSE_CATEGORIES: &[&str] = &[
    "intentional attack",
    "fuel supply emergency",
    "system operability disruption",
];
