//! Scrape target definitions.
//!
//! Each target declares its dashboard view, its filter dimensions in
//! application order, the grid schema, the appended dimension columns, the
//! completeness policy, and the pool size its dashboard tolerates. The
//! course-duration view in particular collapses under concurrent sessions,
//! hence its single worker.

use std::collections::BTreeMap;

use crate::dashboard::summary::{ColumnPair, CompletenessPolicy};
use crate::dashboard::view::{
    ViewConfig, WidgetMatcher, WidgetSlot, DETAIL_REPORT_XPATH, INSTRUCTOR_DETAIL_REPORT_XPATH,
};
use crate::domain::dimension::{names, values_of};
use crate::domain::{FilterDimension, WorkUnit};
use crate::output::OutputLayout;

/// Public enrollment dashboard (trainee-level detail report).
pub const ENROLLMENT_DASHBOARD_URL: &str = "https://app.powerbi.com/view?r=eyJrIjoiZmJhZTY4ZjQtNTk0OS00ZmZlLTg1OTItNTNlMDJmN2I5MjE1IiwidCI6ImJhNTdjY2MxLTEyYzgtNGExOC04NWE3LTMxM2RkNWJmYTZjMSJ9";

/// Public instructor dashboard (certification detail report).
pub const INSTRUCTOR_DASHBOARD_URL: &str = "https://app.powerbi.com/view?r=eyJrIjoiNmYxMTZjZTEtNmM3NC00NDM4LWFkNjUtMjJmNjViNWRmYzY2IiwidCI6ImJhNTdjY2MxLTEyYzgtNGExOC04NWE3LTMxM2RkNWJmYTZjMSJ9&pageName=ReportSection";

/// All states and union territories the dashboards cover.
pub const STATES: [&str; 36] = [
    "ANDAMAN AND NICOBAR ISLANDS",
    "ANDHRA PRADESH",
    "ARUNACHAL PRADESH",
    "ASSAM",
    "BIHAR",
    "CHANDIGARH",
    "CHHATTISGARH",
    "DELHI",
    "GOA",
    "GUJARAT",
    "HARYANA",
    "HIMACHAL PRADESH",
    "JAMMU AND KASHMIR",
    "JHARKHAND",
    "KARNATAKA",
    "KERALA",
    "LADAKH",
    "LAKSHADWEEP",
    "MADHYA PRADESH",
    "MAHARASHTRA",
    "MANIPUR",
    "MEGHALAYA",
    "MIZORAM",
    "NAGALAND",
    "ODISHA",
    "PUDUCHERRY",
    "PUNJAB",
    "RAJASTHAN",
    "SIKKIM",
    "TAMIL NADU",
    "TELANGANA",
    "THE DADRA AND NAGAR HAVELI AND DAMAN AND DIU",
    "TRIPURA",
    "UTTAR PRADESH",
    "UTTARAKHAND",
    "WEST BENGAL",
];

pub const CATEGORIES: [&str; 5] = ["GEN", "OBC", "Others", "SC", "ST"];

pub const COURSE_DURATIONS: [&str; 2] = ["1 Year", "2 Year"];

pub const CITS_FLAGS: [&str; 2] = ["No", "Yes"];

/// Trainee-level grid schema, shared by the enrollment targets.
pub const TRAINEE_SCHEMA: &[&str] = &[
    "Trainee Reg No",
    "TraineeName",
    "Gender",
    "FatherGuardianName",
    "MotherName",
    "Trade",
];

/// Instructor-certification grid schema.
pub const INSTRUCTOR_SCHEMA: &[&str] = &[
    "State",
    "District",
    "ITI",
    "ITI_Category",
    "Total_Units",
    "Total_Post_Sanctioned",
    "Total_Position_Filled",
    "Vacancy",
    "Vacancy%",
];

/// The instructor totals footer renders one cell short of the data rows.
pub const INSTRUCTOR_SUM_PAIRS: &[ColumnPair] = &[
    ColumnPair {
        label: "Total_Units",
        column: 4,
        footer_column: 3,
    },
    ColumnPair {
        label: "Total_Post_Sanctioned",
        column: 5,
        footer_column: 4,
    },
    ColumnPair {
        label: "Total_Position_Filled",
        column: 6,
        footer_column: 5,
    },
];

/// A dimension-value column appended to every record after accumulation.
#[derive(Debug, Clone, Copy)]
pub struct AppendedColumn {
    pub header: &'static str,
    pub dimension: &'static str,
}

/// Full declaration of one scrape target.
#[derive(Debug, Clone)]
pub struct ScrapeTarget {
    pub name: &'static str,
    pub view: ViewConfig,
    /// Filter dimensions in strict application order.
    pub dimensions: Vec<FilterDimension>,
    pub schema: &'static [&'static str],
    pub appended: &'static [AppendedColumn],
    pub completeness: Option<CompletenessPolicy>,
    /// Whether the grid pins a totals row at the end of every window.
    pub footer_totals: bool,
    /// Columns coerced to plain numbers after accumulation.
    pub numeric_columns: &'static [usize],
    /// Columns holding a "<value> %" figure, reduced to the value.
    pub percent_columns: &'static [usize],
    pub workers: usize,
    pub layout: OutputLayout,
}

impl ScrapeTarget {
    /// Full Cartesian product over this target's declared dimensions.
    pub fn cartesian_units(&self) -> Vec<WorkUnit> {
        WorkUnit::cartesian(&self.dimensions)
    }

    /// CSV header: grid schema plus the appended dimension columns.
    pub fn header(&self) -> Vec<String> {
        self.schema
            .iter()
            .map(|c| (*c).to_string())
            .chain(self.appended.iter().map(|c| c.header.to_string()))
            .collect()
    }
}

/// Trainee enrollment by state, year, and social category.
pub fn category() -> ScrapeTarget {
    ScrapeTarget {
        name: "category",
        view: ViewConfig::new(
            ENROLLMENT_DASHBOARD_URL,
            WidgetMatcher::SlicerDropdowns,
            vec![
                WidgetSlot::new(names::STATE, 0),
                WidgetSlot::new(names::SESSION, 1),
                WidgetSlot::new(names::CATEGORY, 11),
            ],
        )
        .with_clear_filters(),
        dimensions: vec![
            FilterDimension::search(names::STATE, values_of(&STATES)),
            FilterDimension::direct(names::SESSION, values_of(&["2015"])),
            FilterDimension::direct(names::CATEGORY, values_of(&CATEGORIES)),
        ],
        schema: TRAINEE_SCHEMA,
        appended: &[
            AppendedColumn {
                header: "State",
                dimension: names::STATE,
            },
            AppendedColumn {
                header: "Category",
                dimension: names::CATEGORY,
            },
            AppendedColumn {
                header: "Year",
                dimension: names::SESSION,
            },
        ],
        completeness: None,
        footer_totals: false,
        numeric_columns: &[],
        percent_columns: &[],
        workers: 5,
        layout: OutputLayout::StateYearCategory,
    }
}

/// Trainee enrollment by year, state, and district. Districts come from the
/// discovery artifact, so units are built from the mapping rather than a
/// plain Cartesian product.
pub fn districts() -> ScrapeTarget {
    ScrapeTarget {
        name: "districts",
        view: ViewConfig::new(
            ENROLLMENT_DASHBOARD_URL,
            WidgetMatcher::SlicerDropdowns,
            vec![
                WidgetSlot::new(names::STATE, 0),
                WidgetSlot::new(names::SESSION, 1),
                WidgetSlot::new(names::DISTRICT, 2),
            ],
        )
        .with_clear_filters(),
        dimensions: vec![
            FilterDimension::search(names::SESSION, values_of(&["2014"])),
            FilterDimension::search(names::STATE, values_of(&STATES)),
            FilterDimension::search(names::DISTRICT, Vec::new()),
        ],
        schema: TRAINEE_SCHEMA,
        appended: &[
            AppendedColumn {
                header: "Year",
                dimension: names::SESSION,
            },
            AppendedColumn {
                header: "State",
                dimension: names::STATE,
            },
            AppendedColumn {
                header: "District",
                dimension: names::DISTRICT,
            },
        ],
        completeness: Some(CompletenessPolicy::RowCount),
        footer_totals: false,
        numeric_columns: &[],
        percent_columns: &[],
        workers: 5,
        layout: OutputLayout::YearStateDistrict,
    }
}

/// Units for the district target: every discovered district of every state,
/// per declared year, applied in session, state, district order.
pub fn district_units(
    target: &ScrapeTarget,
    map: &BTreeMap<String, Vec<String>>,
) -> Vec<WorkUnit> {
    let years: Vec<&str> = target
        .dimensions
        .first()
        .map(|d| d.values.iter().map(String::as_str).collect())
        .unwrap_or_default();

    let mut units = Vec::new();
    for year in years {
        for (state, districts) in map {
            for district in districts {
                units.push(WorkUnit::new(vec![
                    (names::SESSION, year.to_string()),
                    (names::STATE, state.clone()),
                    (names::DISTRICT, district.clone()),
                ]));
            }
        }
    }
    units
}

/// Trainee enrollment by year, state, and course duration.
pub fn course_duration() -> ScrapeTarget {
    ScrapeTarget {
        name: "course_duration",
        view: ViewConfig::new(
            ENROLLMENT_DASHBOARD_URL,
            WidgetMatcher::SlicerDropdowns,
            vec![
                WidgetSlot::new(names::STATE, 0),
                WidgetSlot::new(names::SESSION, 1),
                WidgetSlot::new(names::COURSE_DURATION, 5),
            ],
        )
        .with_clear_filters()
        .with_detail_report(DETAIL_REPORT_XPATH),
        dimensions: vec![
            FilterDimension::search(names::SESSION, values_of(&["2014"])),
            FilterDimension::search(names::STATE, values_of(&STATES)),
            FilterDimension::direct(names::COURSE_DURATION, values_of(&COURSE_DURATIONS)),
        ],
        schema: TRAINEE_SCHEMA,
        appended: &[
            AppendedColumn {
                header: "Year",
                dimension: names::SESSION,
            },
            AppendedColumn {
                header: "State",
                dimension: names::STATE,
            },
            AppendedColumn {
                header: "Course_Duration",
                dimension: names::COURSE_DURATION,
            },
        ],
        completeness: Some(CompletenessPolicy::RowCount),
        footer_totals: false,
        numeric_columns: &[],
        percent_columns: &[],
        workers: 1,
        layout: OutputLayout::YearStateCourseDuration,
    }
}

/// Instructor certification status by state.
pub fn cits_certified() -> ScrapeTarget {
    ScrapeTarget {
        name: "cits_certified",
        view: ViewConfig::new(
            INSTRUCTOR_DASHBOARD_URL,
            WidgetMatcher::SearchInputs,
            vec![
                WidgetSlot::new(names::STATE, 0),
                WidgetSlot::new(names::DISTRICT, 1),
                WidgetSlot::new(names::ITI, 2),
                WidgetSlot::new(names::ITI_CATEGORY, 3),
            ],
        )
        .with_detail_report(INSTRUCTOR_DETAIL_REPORT_XPATH),
        dimensions: vec![
            FilterDimension::search_box(names::STATE, values_of(&STATES)),
            FilterDimension::title_click(names::CITS_CERTIFIED, values_of(&CITS_FLAGS)),
        ],
        schema: INSTRUCTOR_SCHEMA,
        appended: &[AppendedColumn {
            header: "Cits_Certified",
            dimension: names::CITS_CERTIFIED,
        }],
        completeness: Some(CompletenessPolicy::ColumnSums {
            pairs: INSTRUCTOR_SUM_PAIRS,
        }),
        footer_totals: true,
        numeric_columns: &[4, 5, 6, 7],
        percent_columns: &[8],
        workers: 12,
        layout: OutputLayout::CitsByState,
    }
}
