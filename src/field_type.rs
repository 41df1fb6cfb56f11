use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

use crate::error::FormError;

/// Semantic kind of input a column should become.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldType {
    Text,
    Textarea,
    RichText,
    Email,
    Phone,
    Url,
    Number,
    Money,
    Percentage,
    Date,
    Time,
    Zipcode,
    Select,
    Radio,
    Checkbox,
    Multiselect,
    Rating,
    Image,
    File,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Textarea => "textarea",
            FieldType::RichText => "rich-text",
            FieldType::Email => "email",
            FieldType::Phone => "phone",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Money => "money",
            FieldType::Percentage => "percentage",
            FieldType::Date => "date",
            FieldType::Time => "time",
            FieldType::Zipcode => "zipcode",
            FieldType::Select => "select",
            FieldType::Radio => "radio",
            FieldType::Checkbox => "checkbox",
            FieldType::Multiselect => "multiselect",
            FieldType::Rating => "rating",
            FieldType::Image => "image",
            FieldType::File => "file",
        }
    }

    pub fn variants() -> &'static [&'static str] {
        &[
            "text",
            "textarea",
            "rich-text",
            "email",
            "phone",
            "url",
            "number",
            "money",
            "percentage",
            "date",
            "time",
            "zipcode",
            "select",
            "radio",
            "checkbox",
            "multiselect",
            "rating",
            "image",
            "file",
        ]
    }

    /// Types whose values come from a fixed option list.
    pub fn is_choice(&self) -> bool {
        matches!(
            self,
            FieldType::Select | FieldType::Radio | FieldType::Checkbox | FieldType::Multiselect
        )
    }

    /// Types that accept arbitrary typed prose.
    pub fn is_free_text(&self) -> bool {
        matches!(
            self,
            FieldType::Text | FieldType::Textarea | FieldType::RichText
        )
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldType::Number | FieldType::Money | FieldType::Percentage
        )
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = FormError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "text" | "string" => Ok(FieldType::Text),
            "textarea" | "text-area" => Ok(FieldType::Textarea),
            "rich-text" | "richtext" => Ok(FieldType::RichText),
            "email" | "e-mail" => Ok(FieldType::Email),
            "phone" | "tel" => Ok(FieldType::Phone),
            "url" | "link" => Ok(FieldType::Url),
            "number" | "integer" | "float" => Ok(FieldType::Number),
            "money" | "currency" => Ok(FieldType::Money),
            "percentage" | "percent" => Ok(FieldType::Percentage),
            "date" => Ok(FieldType::Date),
            "time" => Ok(FieldType::Time),
            "zipcode" | "zip" | "postal-code" => Ok(FieldType::Zipcode),
            "select" | "dropdown" => Ok(FieldType::Select),
            "radio" => Ok(FieldType::Radio),
            "checkbox" => Ok(FieldType::Checkbox),
            "multiselect" | "multi-select" => Ok(FieldType::Multiselect),
            "rating" => Ok(FieldType::Rating),
            "image" => Ok(FieldType::Image),
            "file" => Ok(FieldType::File),
            _ => Err(FormError::detection(format!(
                "Unknown field type '{value}'. Supported types: {}",
                FieldType::variants().join(", ")
            ))),
        }
    }
}

impl Serialize for FieldType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        FieldType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Currency".parse::<FieldType>().unwrap(), FieldType::Money);
        assert_eq!("rich_text".parse::<FieldType>().unwrap(), FieldType::RichText);
        assert_eq!(" TEL ".parse::<FieldType>().unwrap(), FieldType::Phone);
    }

    #[test]
    fn every_variant_round_trips_through_its_token() {
        for token in FieldType::variants() {
            let parsed: FieldType = token.parse().expect("known variant");
            assert_eq!(parsed.as_str(), *token);
        }
    }

    #[test]
    fn unknown_type_is_a_detection_error() {
        let err = "hologram".parse::<FieldType>().unwrap_err();
        assert_eq!(err.code(), "DETECTION_ERROR");
        assert!(err.to_string().contains("hologram"));
    }
}
