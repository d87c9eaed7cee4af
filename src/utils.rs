use chrono::{NaiveDateTime, SecondsFormat};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{Responder, Response};
use rocket::serde::json::Json;
use serde::Serializer;
use serde_json::Value;

pub fn try_respond(req: &Request, json: &Value, status: Status) -> rocket::response::Result<'static> {
    Json(json.clone())
        .respond_to(req)
        .and_then(|resp| Response::build_from(resp).status(status).ok())
}

/// Stored timestamps carry no zone; they are written and read as UTC.
pub fn serialize_date<S>(date: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let s = date.and_utc().to_rfc3339_opts(SecondsFormat::Millis, true);
    serializer.serialize_str(&s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_derive::Serialize;

    #[derive(Serialize)]
    struct Stamped {
        #[serde(serialize_with = "serialize_date")]
        created_at: NaiveDateTime,
    }

    #[test]
    fn dates_serialize_as_utc_millis() {
        let created_at = NaiveDate::from_ymd_opt(2020, 7, 9)
            .and_then(|d| d.and_hms_milli_opt(20, 11, 0, 0))
            .unwrap();
        let json = serde_json::to_value(Stamped { created_at }).unwrap();
        assert_eq!(json["created_at"], "2020-07-09T20:11:00.000Z");
    }
}
