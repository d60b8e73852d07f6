use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};

/// One encoded training example.
/// input_ids is already cut/padded to max_length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedSample {
    pub input_ids: Vec<u32>,
    pub label:     usize,
}

pub struct SmsDataset {
    samples: Vec<EncodedSample>,
}

impl SmsDataset {
    pub fn new(samples: Vec<EncodedSample>) -> Self { Self { samples } }
}

impl Dataset<EncodedSample> for SmsDataset {
    fn get(&self, index: usize) -> Option<EncodedSample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dataset_get_and_len() {
        let ds = SmsDataset::new(vec![
            EncodedSample { input_ids: vec![2, 3, 0], label: 0 },
            EncodedSample { input_ids: vec![4, 0, 0], label: 2 },
        ]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.get(1).unwrap().label, 2);
        assert!(ds.get(2).is_none());
        assert_eq!(ds.get(0).unwrap().input_ids, vec![2, 3, 0]);
    }
}
