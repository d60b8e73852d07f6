// ============================================================
// Layer 6 — TFLite Flatbuffer Codec
// ============================================================
// ModelDef ⇄ bytes.
//
// Encoding uses flatbuffers::FlatBufferBuilder directly: every
// child object (strings, vectors, nested tables) is created
// before the table that points at it, then the table is built
// slot by slot. Field slot = 4 + 2 * field id from schema.fbs.
//
// Decoding first runs the flatbuffers Verifier over the whole
// buffer, then reads through thin table views. Every field the
// views read is visited by the verifier.

use flatbuffers::{
    FlatBufferBuilder, Follow, ForwardsUOffset, InvalidFlatbuffer, Table,
    TableFinishedWIPOffset, VOffsetT, Vector, Verifiable, Verifier, WIPOffset,
};

use crate::infra::tflite::{
    error::TfliteError,
    schema::{
        options_type, Activation, BuiltinOp, ModelDef, OperatorCodeDef, OperatorDef,
        OperatorOptions, QuantizationDef, SubGraphDef, TensorDef, TensorType,
        FILE_IDENTIFIER,
    },
};

/// vtable slot of schema field `id`
const fn slot(id: VOffsetT) -> VOffsetT {
    4 + 2 * id
}

// ─── Encoding ─────────────────────────────────────────────────────────────────

type TableOffset = WIPOffset<TableFinishedWIPOffset>;

pub fn encode_model(model: &ModelDef) -> Vec<u8> {
    let payload: usize = model.buffers.iter().map(Vec::len).sum();
    let mut fbb = FlatBufferBuilder::with_capacity(payload + 4096);

    // Model.operator_codes
    let mut opcodes: Vec<TableOffset> = Vec::with_capacity(model.operator_codes.len());
    for code in &model.operator_codes {
        let builtin = code.op.code();
        let start   = fbb.start_table();
        fbb.push_slot::<i8>(slot(0), builtin.min(127) as i8, 0); // deprecated_builtin_code
        fbb.push_slot::<i32>(slot(2), code.version, 1);
        fbb.push_slot::<i32>(slot(3), builtin, 0);
        opcodes.push(fbb.end_table(start));
    }
    let opcodes = fbb.create_vector(&opcodes);

    // Model.buffers
    let mut buffers: Vec<TableOffset> = Vec::with_capacity(model.buffers.len());
    for data in &model.buffers {
        let bytes = (!data.is_empty()).then(|| fbb.create_vector(data.as_slice()));
        let start = fbb.start_table();
        if let Some(bytes) = bytes {
            fbb.push_slot_always(slot(0), bytes);
        }
        buffers.push(fbb.end_table(start));
    }
    let buffers = fbb.create_vector(&buffers);

    let subgraph    = encode_subgraph(&mut fbb, &model.subgraph);
    let subgraphs   = fbb.create_vector(&[subgraph]);
    let description = fbb.create_string(&model.description);

    let start = fbb.start_table();
    fbb.push_slot::<u32>(slot(0), model.version, 0);
    fbb.push_slot_always(slot(1), opcodes);
    fbb.push_slot_always(slot(2), subgraphs);
    fbb.push_slot_always(slot(3), description);
    fbb.push_slot_always(slot(4), buffers);
    let root = fbb.end_table(start);

    fbb.finish(root, Some(FILE_IDENTIFIER));
    fbb.finished_data().to_vec()
}

fn encode_subgraph(fbb: &mut FlatBufferBuilder<'_>, graph: &SubGraphDef) -> TableOffset {
    let mut tensors: Vec<TableOffset> = Vec::with_capacity(graph.tensors.len());
    for tensor in &graph.tensors {
        tensors.push(encode_tensor(fbb, tensor));
    }
    let tensors = fbb.create_vector(&tensors);

    let mut operators: Vec<TableOffset> = Vec::with_capacity(graph.operators.len());
    for op in &graph.operators {
        operators.push(encode_operator(fbb, op));
    }
    let operators = fbb.create_vector(&operators);

    let inputs  = fbb.create_vector(graph.inputs.as_slice());
    let outputs = fbb.create_vector(graph.outputs.as_slice());
    let name    = fbb.create_string(&graph.name);

    let start = fbb.start_table();
    fbb.push_slot_always(slot(0), tensors);
    fbb.push_slot_always(slot(1), inputs);
    fbb.push_slot_always(slot(2), outputs);
    fbb.push_slot_always(slot(3), operators);
    fbb.push_slot_always(slot(4), name);
    fbb.end_table(start)
}

fn encode_tensor(fbb: &mut FlatBufferBuilder<'_>, tensor: &TensorDef) -> TableOffset {
    let shape = fbb.create_vector(tensor.shape.as_slice());
    let name  = fbb.create_string(&tensor.name);

    let quantization = tensor.quantization.as_ref().map(|q| {
        let scale      = fbb.create_vector(q.scale.as_slice());
        let zero_point = fbb.create_vector(q.zero_point.as_slice());
        let start      = fbb.start_table();
        fbb.push_slot_always(slot(2), scale);
        fbb.push_slot_always(slot(3), zero_point);
        fbb.end_table(start)
    });

    let start = fbb.start_table();
    fbb.push_slot_always(slot(0), shape);
    fbb.push_slot::<i8>(slot(1), tensor.dtype.code(), 0);
    fbb.push_slot::<u32>(slot(2), tensor.buffer, 0);
    fbb.push_slot_always(slot(3), name);
    if let Some(q) = quantization {
        fbb.push_slot_always(slot(4), q);
    }
    fbb.end_table(start)
}

fn encode_options(fbb: &mut FlatBufferBuilder<'_>, options: &OperatorOptions) -> Option<TableOffset> {
    let start = match options {
        OperatorOptions::None => return None,
        _ => fbb.start_table(),
    };
    match *options {
        OperatorOptions::FullyConnected { activation, keep_num_dims } => {
            fbb.push_slot::<i8>(slot(0), activation.code(), 0);
            fbb.push_slot::<bool>(slot(2), keep_num_dims, false);
        }
        OperatorOptions::Softmax { beta } => {
            fbb.push_slot::<f32>(slot(0), beta, 0.0);
        }
        OperatorOptions::Gather { axis, batch_dims } => {
            fbb.push_slot::<i32>(slot(0), axis, 0);
            fbb.push_slot::<i32>(slot(1), batch_dims, 0);
        }
        OperatorOptions::Reducer { keep_dims } => {
            fbb.push_slot::<bool>(slot(0), keep_dims, false);
        }
        OperatorOptions::Dequantize | OperatorOptions::None => {}
    }
    Some(fbb.end_table(start))
}

fn encode_operator(fbb: &mut FlatBufferBuilder<'_>, op: &OperatorDef) -> TableOffset {
    let inputs  = fbb.create_vector(op.inputs.as_slice());
    let outputs = fbb.create_vector(op.outputs.as_slice());
    let options = encode_options(fbb, &op.options);

    let start = fbb.start_table();
    fbb.push_slot::<u32>(slot(0), op.opcode_index, 0);
    fbb.push_slot_always(slot(1), inputs);
    fbb.push_slot_always(slot(2), outputs);
    fbb.push_slot::<u8>(slot(3), op.options.type_code(), options_type::NONE);
    if let Some(options) = options {
        fbb.push_slot_always(slot(4), options);
    }
    fbb.end_table(start)
}

// ─── Table views ──────────────────────────────────────────────────────────────

macro_rules! table_view {
    ($($name:ident),* $(,)?) => {$(
        #[derive(Clone, Copy)]
        struct $name<'a> {
            tab: Table<'a>,
        }

        impl<'a> Follow<'a> for $name<'a> {
            type Inner = $name<'a>;

            unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
                Self { tab: Table::new(buf, loc) }
            }
        }
    )*};
}

table_view!(
    ModelView,
    OperatorCodeView,
    SubGraphView,
    TensorView,
    QuantizationView,
    OperatorView,
    BufferView,
    FullyConnectedOptionsView,
    SoftmaxOptionsView,
    GatherOptionsView,
    ReducerOptionsView,
    EmptyOptionsView,
);

type TableVec<'a, T> = Vector<'a, ForwardsUOffset<T>>;

// SAFETY (all accessors below): views are only created by `decode_model`
// after `flatbuffers::root` has verified every field they read.

impl<'a> ModelView<'a> {
    fn version(&self) -> u32 {
        unsafe { self.tab.get::<u32>(slot(0), Some(0)) }.unwrap_or(0)
    }
    fn operator_codes(&self) -> Option<TableVec<'a, OperatorCodeView<'a>>> {
        unsafe { self.tab.get::<ForwardsUOffset<TableVec<'a, OperatorCodeView<'a>>>>(slot(1), None) }
    }
    fn subgraphs(&self) -> Option<TableVec<'a, SubGraphView<'a>>> {
        unsafe { self.tab.get::<ForwardsUOffset<TableVec<'a, SubGraphView<'a>>>>(slot(2), None) }
    }
    fn description(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(slot(3), None) }
    }
    fn buffers(&self) -> Option<TableVec<'a, BufferView<'a>>> {
        unsafe { self.tab.get::<ForwardsUOffset<TableVec<'a, BufferView<'a>>>>(slot(4), None) }
    }
}

impl<'a> OperatorCodeView<'a> {
    fn deprecated_builtin_code(&self) -> i8 {
        unsafe { self.tab.get::<i8>(slot(0), Some(0)) }.unwrap_or(0)
    }
    fn version(&self) -> i32 {
        unsafe { self.tab.get::<i32>(slot(2), Some(1)) }.unwrap_or(1)
    }
    fn builtin_code(&self) -> i32 {
        unsafe { self.tab.get::<i32>(slot(3), Some(0)) }.unwrap_or(0)
    }
}

impl<'a> SubGraphView<'a> {
    fn tensors(&self) -> Option<TableVec<'a, TensorView<'a>>> {
        unsafe { self.tab.get::<ForwardsUOffset<TableVec<'a, TensorView<'a>>>>(slot(0), None) }
    }
    fn inputs(&self) -> Option<Vector<'a, i32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i32>>>(slot(1), None) }
    }
    fn outputs(&self) -> Option<Vector<'a, i32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i32>>>(slot(2), None) }
    }
    fn operators(&self) -> Option<TableVec<'a, OperatorView<'a>>> {
        unsafe { self.tab.get::<ForwardsUOffset<TableVec<'a, OperatorView<'a>>>>(slot(3), None) }
    }
    fn name(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(slot(4), None) }
    }
}

impl<'a> TensorView<'a> {
    fn shape(&self) -> Option<Vector<'a, i32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i32>>>(slot(0), None) }
    }
    fn dtype(&self) -> i8 {
        unsafe { self.tab.get::<i8>(slot(1), Some(0)) }.unwrap_or(0)
    }
    fn buffer(&self) -> u32 {
        unsafe { self.tab.get::<u32>(slot(2), Some(0)) }.unwrap_or(0)
    }
    fn name(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(slot(3), None) }
    }
    fn quantization(&self) -> Option<QuantizationView<'a>> {
        unsafe { self.tab.get::<ForwardsUOffset<QuantizationView<'a>>>(slot(4), None) }
    }
}

impl<'a> QuantizationView<'a> {
    fn scale(&self) -> Option<Vector<'a, f32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, f32>>>(slot(2), None) }
    }
    fn zero_point(&self) -> Option<Vector<'a, i64>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i64>>>(slot(3), None) }
    }
}

impl<'a> OperatorView<'a> {
    fn opcode_index(&self) -> u32 {
        unsafe { self.tab.get::<u32>(slot(0), Some(0)) }.unwrap_or(0)
    }
    fn inputs(&self) -> Option<Vector<'a, i32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i32>>>(slot(1), None) }
    }
    fn outputs(&self) -> Option<Vector<'a, i32>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, i32>>>(slot(2), None) }
    }
    fn options_type(&self) -> u8 {
        unsafe { self.tab.get::<u8>(slot(3), Some(0)) }.unwrap_or(0)
    }
    fn options<T: Follow<'a> + 'a>(&self) -> Option<T::Inner> {
        unsafe { self.tab.get::<ForwardsUOffset<T>>(slot(4), None) }
    }
}

impl<'a> BufferView<'a> {
    fn data(&self) -> Option<Vector<'a, u8>> {
        unsafe { self.tab.get::<ForwardsUOffset<Vector<'a, u8>>>(slot(0), None) }
    }
}

impl<'a> FullyConnectedOptionsView<'a> {
    fn activation(&self) -> i8 {
        unsafe { self.tab.get::<i8>(slot(0), Some(0)) }.unwrap_or(0)
    }
    fn keep_num_dims(&self) -> bool {
        unsafe { self.tab.get::<bool>(slot(2), Some(false)) }.unwrap_or(false)
    }
}

impl<'a> SoftmaxOptionsView<'a> {
    fn beta(&self) -> f32 {
        unsafe { self.tab.get::<f32>(slot(0), Some(0.0)) }.unwrap_or(0.0)
    }
}

impl<'a> GatherOptionsView<'a> {
    fn axis(&self) -> i32 {
        unsafe { self.tab.get::<i32>(slot(0), Some(0)) }.unwrap_or(0)
    }
    fn batch_dims(&self) -> i32 {
        unsafe { self.tab.get::<i32>(slot(1), Some(0)) }.unwrap_or(0)
    }
}

impl<'a> ReducerOptionsView<'a> {
    fn keep_dims(&self) -> bool {
        unsafe { self.tab.get::<bool>(slot(0), Some(false)) }.unwrap_or(false)
    }
}

// ─── Verification ─────────────────────────────────────────────────────────────

impl Verifiable for ModelView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("version", slot(0), false)?
            .visit_field::<ForwardsUOffset<TableVec<'_, OperatorCodeView>>>("operator_codes", slot(1), false)?
            .visit_field::<ForwardsUOffset<TableVec<'_, SubGraphView>>>("subgraphs", slot(2), false)?
            .visit_field::<ForwardsUOffset<&str>>("description", slot(3), false)?
            .visit_field::<ForwardsUOffset<TableVec<'_, BufferView>>>("buffers", slot(4), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for OperatorCodeView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>("deprecated_builtin_code", slot(0), false)?
            .visit_field::<i32>("version", slot(2), false)?
            .visit_field::<i32>("builtin_code", slot(3), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for SubGraphView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<TableVec<'_, TensorView>>>("tensors", slot(0), false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", slot(1), false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", slot(2), false)?
            .visit_field::<ForwardsUOffset<TableVec<'_, OperatorView>>>("operators", slot(3), false)?
            .visit_field::<ForwardsUOffset<&str>>("name", slot(4), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for TensorView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("shape", slot(0), false)?
            .visit_field::<i8>("type", slot(1), false)?
            .visit_field::<u32>("buffer", slot(2), false)?
            .visit_field::<ForwardsUOffset<&str>>("name", slot(3), false)?
            .visit_field::<ForwardsUOffset<QuantizationView>>("quantization", slot(4), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for QuantizationView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, f32>>>("scale", slot(2), false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i64>>>("zero_point", slot(3), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for OperatorView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("opcode_index", slot(0), false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", slot(1), false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", slot(2), false)?
            .visit_union::<u8, _>(
                "builtin_options_type",
                slot(3),
                "builtin_options",
                slot(4),
                false,
                |key, v, pos| match key {
                    options_type::FULLY_CONNECTED => v
                        .verify_union_variant::<ForwardsUOffset<FullyConnectedOptionsView>>("FullyConnectedOptions", pos),
                    options_type::SOFTMAX => v
                        .verify_union_variant::<ForwardsUOffset<SoftmaxOptionsView>>("SoftmaxOptions", pos),
                    options_type::GATHER => v
                        .verify_union_variant::<ForwardsUOffset<GatherOptionsView>>("GatherOptions", pos),
                    options_type::REDUCER => v
                        .verify_union_variant::<ForwardsUOffset<ReducerOptionsView>>("ReducerOptions", pos),
                    options_type::DEQUANTIZE => v
                        .verify_union_variant::<ForwardsUOffset<EmptyOptionsView>>("DequantizeOptions", pos),
                    _ => Ok(()),
                },
            )?
            .finish();
        Ok(())
    }
}

impl Verifiable for BufferView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, u8>>>("data", slot(0), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for FullyConnectedOptionsView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i8>("fused_activation_function", slot(0), false)?
            .visit_field::<bool>("keep_num_dims", slot(2), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for SoftmaxOptionsView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<f32>("beta", slot(0), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for GatherOptionsView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<i32>("axis", slot(0), false)?
            .visit_field::<i32>("batch_dims", slot(1), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for ReducerOptionsView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<bool>("keep_dims", slot(0), false)?
            .finish();
        Ok(())
    }
}

impl Verifiable for EmptyOptionsView<'_> {
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?.finish();
        Ok(())
    }
}

// ─── Decoding ─────────────────────────────────────────────────────────────────

pub fn decode_model(bytes: &[u8]) -> Result<ModelDef, TfliteError> {
    // root offset + identifier
    let header = flatbuffers::SIZE_UOFFSET + flatbuffers::FILE_IDENTIFIER_LENGTH;
    if bytes.len() < header || !flatbuffers::buffer_has_identifier(bytes, FILE_IDENTIFIER, false) {
        return Err(TfliteError::BadIdentifier(FILE_IDENTIFIER));
    }
    let model = flatbuffers::root::<ModelView>(bytes)?;

    let operator_codes = model
        .operator_codes()
        .ok_or(TfliteError::MissingField("operator_codes"))?
        .iter()
        .map(|code| {
            // Older converters only fill the deprecated byte field
            let builtin = code.builtin_code().max(code.deprecated_builtin_code() as i32);
            Ok(OperatorCodeDef {
                op:      BuiltinOp::from_code(builtin)?,
                version: code.version(),
            })
        })
        .collect::<Result<Vec<_>, TfliteError>>()?;

    let subgraphs = model.subgraphs().ok_or(TfliteError::MissingField("subgraphs"))?;
    if subgraphs.len() != 1 {
        return Err(TfliteError::Unsupported(format!(
            "{} subgraphs (exactly one expected)",
            subgraphs.len()
        )));
    }
    let subgraph = decode_subgraph(subgraphs.get(0))?;

    let buffers = model
        .buffers()
        .ok_or(TfliteError::MissingField("buffers"))?
        .iter()
        .map(|b| b.data().map(|d| d.bytes().to_vec()).unwrap_or_default())
        .collect();

    Ok(ModelDef {
        version: model.version(),
        description: model.description().unwrap_or_default().to_string(),
        operator_codes,
        subgraph,
        buffers,
    })
}

fn decode_subgraph(graph: SubGraphView<'_>) -> Result<SubGraphDef, TfliteError> {
    let tensors = graph
        .tensors()
        .ok_or(TfliteError::MissingField("subgraph.tensors"))?
        .iter()
        .map(decode_tensor)
        .collect::<Result<Vec<_>, TfliteError>>()?;

    let operators = graph
        .operators()
        .ok_or(TfliteError::MissingField("subgraph.operators"))?
        .iter()
        .map(decode_operator)
        .collect::<Result<Vec<_>, TfliteError>>()?;

    Ok(SubGraphDef {
        name:    graph.name().unwrap_or_default().to_string(),
        tensors,
        inputs:  graph.inputs().map(|v| v.iter().collect()).unwrap_or_default(),
        outputs: graph.outputs().map(|v| v.iter().collect()).unwrap_or_default(),
        operators,
    })
}

fn decode_tensor(tensor: TensorView<'_>) -> Result<TensorDef, TfliteError> {
    let quantization = tensor
        .quantization()
        .and_then(|q| {
            let scale = q.scale()?.iter().collect::<Vec<f32>>();
            let zero_point = q
                .zero_point()
                .map(|z| z.iter().collect())
                .unwrap_or_else(|| vec![0; scale.len()]);
            Some(QuantizationDef { scale, zero_point })
        })
        .filter(|q| !q.scale.is_empty());

    Ok(TensorDef {
        name:   tensor.name().unwrap_or_default().to_string(),
        shape:  tensor.shape().map(|s| s.iter().collect()).unwrap_or_default(),
        dtype:  TensorType::from_code(tensor.dtype())?,
        buffer: tensor.buffer(),
        quantization,
    })
}

fn decode_operator(op: OperatorView<'_>) -> Result<OperatorDef, TfliteError> {
    let options = match op.options_type() {
        options_type::NONE => OperatorOptions::None,
        options_type::FULLY_CONNECTED => match op.options::<FullyConnectedOptionsView>() {
            Some(o) => OperatorOptions::FullyConnected {
                activation:    Activation::from_code(o.activation())?,
                keep_num_dims: o.keep_num_dims(),
            },
            None => OperatorOptions::FullyConnected {
                activation:    Activation::None,
                keep_num_dims: false,
            },
        },
        options_type::SOFTMAX => OperatorOptions::Softmax {
            beta: op.options::<SoftmaxOptionsView>().map_or(0.0, |o| o.beta()),
        },
        options_type::GATHER => {
            let o = op.options::<GatherOptionsView>();
            OperatorOptions::Gather {
                axis:       o.map_or(0, |o| o.axis()),
                batch_dims: o.map_or(0, |o| o.batch_dims()),
            }
        }
        options_type::REDUCER => OperatorOptions::Reducer {
            keep_dims: op.options::<ReducerOptionsView>().is_some_and(|o| o.keep_dims()),
        },
        options_type::DEQUANTIZE => OperatorOptions::Dequantize,
        other => return Err(TfliteError::Unsupported(format!("builtin options type {other}"))),
    };

    Ok(OperatorDef {
        opcode_index: op.opcode_index(),
        inputs:       op.inputs().map(|v| v.iter().collect()).unwrap_or_default(),
        outputs:      op.outputs().map(|v| v.iter().collect()).unwrap_or_default(),
        options,
    })
}
