// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// This layer contains the Burn model and its training loop.
// Apart from the data pipeline's Dataset/Batcher impls, no
// other layer touches Burn tensors.
//
//   model.rs   — The classifier architecture
//                • Word embeddings
//                • Mean pooling over the sequence
//                • Dense hidden layer (ReLU)
//                • Three-way output head
//                plus export of the trained parameters as
//                plain f32 arrays for the TFLite writer
//
//   trainer.rs — The training loop
//                Full-batch forward pass, cross-entropy loss,
//                backward pass and Adam step per epoch
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

/// Embedding + pooling + dense classifier
pub mod model;

/// Seeded full-batch training loop
pub mod trainer;
