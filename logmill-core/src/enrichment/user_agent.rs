use woothee::parser::Parser;

const UNKNOWN: &str = "Other";

/// Derived identity for one raw user-agent string. Classification is a pure
/// function of the string, so re-deriving it is always safe.
#[derive(Debug, Clone, PartialEq)]
pub struct UserAgentClass {
    pub os: String,
    pub browser: String,
    pub device_type: DeviceType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Pc,
    Bot,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Tablet => "Tablet",
            DeviceType::Pc => "PC",
            DeviceType::Bot => "Bot",
            DeviceType::Other => "Other",
        }
    }
}

pub struct UaClassifier {
    parser: Parser,
}

impl Default for UaClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl UaClassifier {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    pub fn classify(&self, raw: &str) -> UserAgentClass {
        let Some(result) = self.parser.parse(raw) else {
            return UserAgentClass {
                os: UNKNOWN.to_string(),
                browser: UNKNOWN.to_string(),
                device_type: DeviceType::Other,
            };
        };

        // Mobile > Tablet > PC > Bot; anything else is Other.
        let device_type = match result.category {
            "smartphone" | "mobilephone" => DeviceType::Mobile,
            "tablet" => DeviceType::Tablet,
            "pc" => DeviceType::Pc,
            "crawler" => DeviceType::Bot,
            _ => DeviceType::Other,
        };

        UserAgentClass {
            os: known_or_other(result.os),
            browser: known_or_other(result.name),
            device_type,
        }
    }
}

fn known_or_other(value: &str) -> String {
    match value {
        "" | "UNKNOWN" => UNKNOWN.to_string(),
        s => s.to_string(),
    }
}
