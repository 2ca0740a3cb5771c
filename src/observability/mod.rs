pub mod pii;
pub mod metrics;

use chrono::Utc;
use serde_json::{json, Value};
use self::pii::mask_pii;

/// JSON-lines logger. Info goes to stdout, errors to stderr.
#[derive(Debug, Clone)]
pub struct Logger {
    service_id: String,
}

impl Logger {
    pub fn new(service_id: String) -> Self {
        Self { service_id }
    }

    pub fn info(&self, msg: &str, context: Option<&Value>) {
        let entry = self.build_entry("INFO", msg, context);
        println!("{}", serde_json::to_string(&entry).unwrap_or_default());
    }

    pub fn warn(&self, msg: &str, context: Option<&Value>) {
        let entry = self.build_entry("WARN", msg, context);
        eprintln!("{}", serde_json::to_string(&entry).unwrap_or_default());
    }

    pub fn error(&self, msg: &str, context: Option<&Value>) {
        let entry = self.build_entry("ERROR", msg, context);
        eprintln!("{}", serde_json::to_string(&entry).unwrap_or_default());
    }

    fn build_entry(&self, level: &str, msg: &str, context: Option<&Value>) -> Value {
        let now = Utc::now().to_rfc3339();
        let safe_msg = mask_pii(msg);

        let mut base = json!({
            "ts": now,
            "level": level,
            "msg": safe_msg,
            "service_id": self.service_id,
        });

        if let (Some(base_obj), Some(ctx_obj)) = (base.as_object_mut(), context.and_then(|c| c.as_object())) {
            for (k, v) in ctx_obj {
                let safe_v = match v.as_str() {
                    Some(s) => json!(mask_pii(s)),
                    None => v.clone(),
                };
                base_obj.insert(k.clone(), safe_v);
            }
        }

        base
    }
}
