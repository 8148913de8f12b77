use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "backend": {
                "type": "object",
                "properties": {
                    "base_url": { "type": "string", "format": "uri" },
                    "timeout_secs": { "type": "integer", "minimum": 1 }
                }
            },
            "simulator": {
                "type": "object",
                "properties": {
                    "tick_count": { "type": "integer", "minimum": 1 },
                    "jitter": { "type": "number", "minimum": 0, "exclusiveMaximum": 1 },
                    "complexity": { "$ref": "#/$defs/factor_range" },
                    "inter_stage_delay_ms": { "$ref": "#/$defs/delay_range" },
                    "fast_forward_interval_ms": { "type": "integer", "minimum": 0 },
                    "seed": { "type": "integer", "minimum": 0 },
                    "failure_policy": { "type": "string", "enum": ["complete", "freeze"] },
                    "stages": { "type": "array", "items": { "$ref": "#/$defs/stage" } }
                }
            },
            "sender": {
                "type": "object",
                "properties": {
                    "cc": { "type": "string" },
                    "subject": { "type": "string" }
                }
            }
        },
        "$defs": {
            "factor_range": {
                "type": "object",
                "required": ["min", "max"],
                "properties": {
                    "min": { "type": "number", "exclusiveMinimum": 0 },
                    "max": { "type": "number", "exclusiveMinimum": 0 }
                }
            },
            "delay_range": {
                "type": "object",
                "required": ["min", "max"],
                "properties": {
                    "min": { "type": "integer", "minimum": 0 },
                    "max": { "type": "integer", "minimum": 0 }
                }
            },
            "stage": {
                "type": "object",
                "required": ["id", "display_name", "estimated_duration_secs"],
                "properties": {
                    "id": { "type": "string" },
                    "display_name": { "type": "string" },
                    "description": { "type": "string" },
                    "estimated_duration_secs": { "type": "number", "exclusiveMinimum": 0 },
                    "messages": { "type": "array", "items": { "type": "string" } }
                }
            }
        }
    })
});
