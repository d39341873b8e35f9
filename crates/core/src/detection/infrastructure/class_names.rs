//! Class-id to label mapping for YOLO models.
//!
//! Ultralytics ONNX exports embed their class table in the model metadata
//! under `names`, formatted as a Python dict literal:
//! `{0: 'person', 1: 'bicycle', ...}`. Models without it fall back to COCO.

pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

#[derive(Clone, Debug, PartialEq)]
pub struct ClassNames {
    names: Vec<String>,
}

impl ClassNames {
    pub fn coco() -> Self {
        Self {
            names: COCO_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Parses the `names` metadata entry. Returns `None` if nothing usable is found.
    pub fn from_metadata(raw: &str) -> Option<Self> {
        let body = raw.trim().strip_prefix('{')?.strip_suffix('}')?;
        let mut entries: Vec<(usize, String)> = Vec::new();
        for item in split_entries(body) {
            let (key, value) = item.split_once(':')?;
            let id = key.trim().parse::<usize>().ok()?;
            let name = value
                .trim()
                .trim_matches(|c| c == '\'' || c == '"')
                .to_string();
            entries.push((id, name));
        }
        if entries.is_empty() {
            return None;
        }

        let len = entries.iter().map(|(id, _)| id + 1).max().unwrap_or(0);
        let mut names: Vec<String> = (0..len).map(|i| i.to_string()).collect();
        for (id, name) in entries {
            names[id] = name;
        }
        Some(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label for `class_id`; unknown ids render as the number itself.
    pub fn label(&self, class_id: usize) -> String {
        self.names
            .get(class_id)
            .cloned()
            .unwrap_or_else(|| class_id.to_string())
    }
}

/// Splits `0: 'a', 1: 'b, c'` on commas outside quotes.
fn split_entries(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',') => {
                items.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&body[start..]);
    items.into_iter().filter(|s| !s.trim().is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coco_table() {
        let names = ClassNames::coco();
        assert_eq!(names.len(), 80);
        assert_eq!(names.label(0), "person");
        assert_eq!(names.label(79), "toothbrush");
    }

    #[test]
    fn test_unknown_id_renders_as_number() {
        assert_eq!(ClassNames::coco().label(80), "80");
    }

    #[test]
    fn test_parses_ultralytics_metadata() {
        let names = ClassNames::from_metadata("{0: 'person', 1: 'bicycle', 2: 'traffic light'}")
            .unwrap();
        assert_eq!(names.len(), 3);
        assert_eq!(names.label(2), "traffic light");
    }

    #[test]
    fn test_quoted_commas_stay_in_label() {
        let names = ClassNames::from_metadata(r#"{0: "nut, bolt", 1: 'washer'}"#).unwrap();
        assert_eq!(names.label(0), "nut, bolt");
        assert_eq!(names.label(1), "washer");
    }

    #[test]
    fn test_sparse_ids_fill_gaps_with_numbers() {
        let names = ClassNames::from_metadata("{0: 'a', 2: 'c'}").unwrap();
        assert_eq!(names.label(1), "1");
        assert_eq!(names.label(2), "c");
    }

    #[test]
    fn test_rejects_malformed_metadata() {
        assert!(ClassNames::from_metadata("person, bicycle").is_none());
        assert!(ClassNames::from_metadata("{}").is_none());
        assert!(ClassNames::from_metadata("{zero: 'person'}").is_none());
    }
}
