//! JSON schema for structured creatives output.
//!
//! The same schema is used as the OpenAI `json_schema` response format and
//! as the Anthropic tool `input_schema`. OpenAI strict mode requires every
//! property to be listed in `required` and `additionalProperties: false`.

use serde_json::{Value, json};

pub const CREATIVES_TOOL: &str = "ad_creatives";

pub fn creatives_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "creatives": {
                "type": "array",
                "description": "Ad creatives for the clinical trial.",
                "items": {
                    "type": "object",
                    "properties": {
                        "target_demo": {
                            "type": "array",
                            "items": {"type": "string"},
                            "description": "Audience segments the creative is written for."
                        },
                        "headline": {"type": "string"},
                        "primary_text": {"type": "string"},
                        "description": {"type": "string"},
                        "call_to_action": {"type": "string"},
                        "prompt_for_ad_image": {
                            "type": "string",
                            "description": "Prompt for an image generator to illustrate the ad."
                        }
                    },
                    "required": [
                        "target_demo",
                        "headline",
                        "primary_text",
                        "description",
                        "call_to_action",
                        "prompt_for_ad_image"
                    ],
                    "additionalProperties": false
                }
            }
        },
        "required": ["creatives"],
        "additionalProperties": false
    })
}
