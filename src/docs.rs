use crate::api::attendance::ClockRequest;
use crate::api::bulk::{BulkClockRequest, BulkEmployeeEntry, BulkEntryResult};
use crate::geofence::GeoPoint;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Gateway API",
        version = "1.0.0",
        description = r#"
## Attendance Gateway

Backend proxy for employee **clock-in / clock-out** against a third-party HR
attendance provider.

### 🔹 Key Features
- **Clock In / Clock Out**
  - Single and bulk variants, forwarded to the provider's REST API
- **Attendance Retrieval**
  - Per-employee records and monthly summaries
- **Geofencing**
  - Optional haversine-based validation against configured office zones

### 🧪 Mock Mode
Without a configured `PROVIDER_API_KEY` every call is answered locally with
deterministic mock data (`"mock": true`), so the service stays fully usable
in demos and development.

### 📦 Response Format
- JSON envelopes: `{"success": true, "message", "data"}` on success
- `{"success": false, "message"}` on validation failures

---
Built with **Rust**, **Actix Web**, **Reqwest**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::health::health,
        crate::api::health::index,

        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::get_attendance,
        crate::api::attendance::get_attendance_summary,

        crate::api::bulk::bulk_clock_in,
        crate::api::bulk::bulk_clock_out
    ),
    components(
        schemas(
            ClockRequest,
            BulkClockRequest,
            BulkEmployeeEntry,
            BulkEntryResult,
            GeoPoint
        )
    ),
    tags(
        (name = "Attendance", description = "Clock actions and attendance retrieval"),
        (name = "Bulk", description = "Batched clock actions"),
        (name = "System", description = "Health and service metadata"),
    )
)]
pub struct ApiDoc;
