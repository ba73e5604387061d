use crate::api::attendance::{
    AttendanceFilter, AttendanceListResponse, CheckInReq, CheckOutReq,
};
use crate::api::report::{CreateReport, ReportFilter, ReportListResponse, UpdateReportStatus};
use crate::api::schedule::{
    CalendarCell, CalendarQuery, CalendarResponse, CreateSchedule, ScheduleFilter,
};
use crate::api::truck::{CreateTruck, UpdateTruck};
use crate::api::user::{CreateUser, UserListResponse, UserQuery, UserResponse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, MemberRole, TeamMember};
use crate::model::report::{ReportStatus, WasteReport};
use crate::model::schedule::ScheduleEntry;
use crate::model::truck::Truck;
use crate::workflow::calendar::DayCell;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Waste Management Admin API",
        version = "1.0.0",
        description = r#"
## Municipal Waste Management Administration

This API powers the administration console of a **municipal waste-management** operation.

### 🔹 Key Features
- **Team Attendance**
  - Check-in / check-out of collection teams, admin verification and rejection
- **Truck Scheduling**
  - Collection runs per truck and barangay, month calendar view
- **Report Triage**
  - Resident waste reports filtered by barangay, triaged to resolution
- **Account Management**
  - Console accounts for admins, dispatchers and crews

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Only authorized roles such as **Admin** or **Dispatcher** can access sensitive operations.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::verify,
        crate::api::attendance::reject,
        crate::api::attendance::list_attendance,

        crate::api::schedule::create_schedule,
        crate::api::schedule::list_schedules,
        crate::api::schedule::delete_schedule,
        crate::api::schedule::calendar_view,

        crate::api::report::create_report,
        crate::api::report::list_reports,
        crate::api::report::get_report,
        crate::api::report::update_report_status,

        crate::api::truck::create_truck,
        crate::api::truck::list_trucks,
        crate::api::truck::update_truck,
        crate::api::truck::delete_truck,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::delete_user
    ),
    components(
        schemas(
            CheckInReq,
            CheckOutReq,
            AttendanceFilter,
            AttendanceListResponse,
            AttendanceRecord,
            AttendanceStatus,
            TeamMember,
            MemberRole,
            CreateSchedule,
            ScheduleFilter,
            ScheduleEntry,
            CalendarQuery,
            CalendarCell,
            CalendarResponse,
            DayCell,
            CreateReport,
            ReportFilter,
            ReportListResponse,
            UpdateReportStatus,
            WasteReport,
            ReportStatus,
            CreateTruck,
            UpdateTruck,
            Truck,
            CreateUser,
            UserQuery,
            UserResponse,
            UserListResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Team attendance APIs"),
        (name = "Schedule", description = "Truck scheduling APIs"),
        (name = "Report", description = "Waste report triage APIs"),
        (name = "Truck", description = "Truck registry APIs"),
        (name = "User", description = "Console account APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
