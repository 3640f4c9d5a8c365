use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowProps {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            title: "Hazel Engine".to_owned(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

impl WindowProps {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_window() {
        let props = WindowProps::default();
        assert_eq!(props.title, "Hazel Engine");
        assert_eq!((props.width, props.height), (1280, 720));
        assert!(props.vsync);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let props: WindowProps = serde_json::from_str(r#"{ "width": 640, "vsync": false }"#).unwrap();
        assert_eq!(props.width, 640);
        assert_eq!(props.height, 720);
        assert!(!props.vsync);
        assert_eq!(props.title, "Hazel Engine");
    }
}
