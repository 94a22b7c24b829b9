#![allow(dead_code)]
//! A MaxPool problem: converted and run through tfbridge, or computed by a
//! straightforward ONNX reference.
use tfbridge_core::internal::*;
use tfbridge_core::ndarray::{indices, ArrayD, Dimension, IxDyn};
use tfbridge_core::ops::nn::DataFormat;
use tfbridge_onnx::{onnx, ConversionOptions, ConversionResult, OnnxGraph, OnnxNode, Variable};

pub fn setup_test_logger() {
    let _ = env_logger::Builder::from_env("TFBRIDGE_LOG").try_init();
}

#[derive(Debug, Clone, PartialEq)]
pub enum Padding {
    Explicit(Vec<usize>),
    Auto(&'static str),
}

#[derive(Debug, Clone)]
pub struct MaxPoolProblem {
    /// NCHW, whatever `data_format`.
    pub data: ArrayD<f32>,
    pub data_format: DataFormat,
    pub kernel_shape: Vec<usize>,
    pub strides: Vec<usize>,
    pub dilations: Vec<usize>,
    pub padding: Padding,
    pub ceil_mode: bool,
    pub count_include_pad: bool,
}

impl MaxPoolProblem {
    pub fn new(data: ArrayD<f32>, kernel_shape: &[usize]) -> MaxPoolProblem {
        let spatial = kernel_shape.len();
        MaxPoolProblem {
            data,
            data_format: DataFormat::NCHW,
            kernel_shape: kernel_shape.to_vec(),
            strides: vec![1; spatial],
            dilations: vec![1; spatial],
            padding: Padding::Explicit(vec![0; 2 * spatial]),
            ceil_mode: false,
            count_include_pad: false,
        }
    }

    pub fn with_strides(self, strides: &[usize]) -> MaxPoolProblem {
        MaxPoolProblem { strides: strides.to_vec(), ..self }
    }

    pub fn with_dilations(self, dilations: &[usize]) -> MaxPoolProblem {
        MaxPoolProblem { dilations: dilations.to_vec(), ..self }
    }

    pub fn with_padding(self, padding: Padding) -> MaxPoolProblem {
        MaxPoolProblem { padding, ..self }
    }

    pub fn with_ceil_mode(self, ceil_mode: bool) -> MaxPoolProblem {
        MaxPoolProblem { ceil_mode, ..self }
    }

    pub fn with_count_include_pad(self, count_include_pad: bool) -> MaxPoolProblem {
        MaxPoolProblem { count_include_pad, ..self }
    }

    pub fn with_data_format(self, data_format: DataFormat) -> MaxPoolProblem {
        MaxPoolProblem { data_format, ..self }
    }

    fn ints(v: &[usize]) -> Vec<i64> {
        v.iter().map(|&x| x as i64).collect()
    }

    fn to_format(&self, nchw: &ArrayD<f32>) -> ArrayD<f32> {
        match self.data_format {
            DataFormat::NCHW => nchw.clone(),
            DataFormat::NHWC => {
                let rank = nchw.ndim();
                let mut perm: Vec<usize> = vec![0];
                perm.extend(2..rank);
                perm.push(1);
                nchw.view().permuted_axes(IxDyn(&perm)).as_standard_layout().into_owned()
            }
        }
    }

    fn from_format(&self, data: ArrayD<f32>) -> ArrayD<f32> {
        match self.data_format {
            DataFormat::NCHW => data,
            DataFormat::NHWC => {
                let rank = data.ndim();
                let mut perm: Vec<usize> = vec![0, rank - 1];
                perm.extend(1..rank - 1);
                data.view().permuted_axes(IxDyn(&perm)).as_standard_layout().into_owned()
            }
        }
    }

    pub fn node(&self) -> OnnxNode {
        let mut node = OnnxNode::new("pool", "MaxPool")
            .with_attr("kernel_shape", Self::ints(&self.kernel_shape))
            .with_attr("strides", Self::ints(&self.strides))
            .with_attr("dilations", Self::ints(&self.dilations))
            .with_attr("ceil_mode", self.ceil_mode as i64)
            .with_attr("count_include_pad", self.count_include_pad as i64)
            .with_input(Variable::named("x"))
            .with_output(Variable::named("y"));
        node = match &self.padding {
            Padding::Explicit(pads) => node.with_attr("pads", Self::ints(pads)),
            Padding::Auto(auto_pad) => node.with_attr("auto_pad", *auto_pad),
        };
        node
    }

    pub fn input_shape(&self) -> Vec<usize> {
        self.to_format(&self.data).shape().to_vec()
    }

    pub fn graph_with_input_shape(&self, shape: ShapeFact) -> OnnxGraph {
        OnnxGraph::default()
            .with_input(Variable::typed("x", DatumType::F32, shape))
            .with_node(self.node())
            .with_output("y")
    }

    pub fn convert(&self) -> TfResult<ConversionResult> {
        self.convert_with_input_shape(ShapeFact::from(&*self.input_shape()))
    }

    pub fn convert_with_input_shape(&self, shape: ShapeFact) -> TfResult<ConversionResult> {
        setup_test_logger();
        let options = ConversionOptions::default().with_data_format(self.data_format);
        onnx().convert_with_options(&self.graph_with_input_shape(shape), options)
    }

    pub fn run(&self, converted: &ConversionResult) -> TfResult<ArrayD<f32>> {
        let plan = SimplePlan::new(&converted.model)?;
        let input = self.to_format(&self.data).into_tensor();
        let outputs = plan.run(tvec!(input))?;
        let output = outputs[0].to_array_view::<f32>()?.to_owned();
        Ok(self.from_format(output))
    }

    /// Convert and run, returning the NCHW output.
    pub fn tfbridge(&self) -> TfResult<ArrayD<f32>> {
        self.run(&self.convert()?)
    }

    /// Value the padded area contributes, `None` when it is ignored.
    ///
    /// Explicit and SAME_LOWER padding (and SAME_UPPER when padding counts)
    /// is materialized with zeros before pooling.
    pub fn pad_value(&self) -> Option<f32> {
        match self.padding {
            Padding::Explicit(_) | Padding::Auto("SAME_LOWER") => Some(0.0),
            Padding::Auto("SAME_UPPER") if self.count_include_pad => Some(0.0),
            _ => None,
        }
    }

    fn field(&self, axis: usize) -> usize {
        (self.kernel_shape[axis] - 1) * self.dilations[axis] + 1
    }

    /// Output length and leading padding of one spatial axis.
    pub fn geometry(&self, axis: usize) -> (usize, usize) {
        let input = self.data.shape()[axis + 2];
        let stride = self.strides[axis];
        let field = self.field(axis);
        match &self.padding {
            Padding::Explicit(pads) => {
                let spatial = self.kernel_shape.len();
                let (before, after) = (pads[axis], pads[axis + spatial]);
                let dividend = input + before + after - field;
                if self.ceil_mode {
                    let mut output = dividend.div_ceil(stride) + 1;
                    if (output - 1) * stride >= input + before {
                        output -= 1;
                    }
                    (output, before)
                } else {
                    (dividend / stride + 1, before)
                }
            }
            Padding::Auto("VALID") => ((input - field) / stride + 1, 0),
            Padding::Auto(policy) => {
                let output = input.div_ceil(stride);
                let total = ((output - 1) * stride + field).saturating_sub(input);
                let before = if *policy == "SAME_LOWER" { total - total / 2 } else { total / 2 };
                (output, before)
            }
        }
    }

    pub fn output_shape(&self) -> Vec<usize> {
        let mut shape = self.data.shape()[0..2].to_vec();
        shape.extend((0..self.kernel_shape.len()).map(|axis| self.geometry(axis).0));
        shape
    }

    /// ONNX MaxPool over `data`, NCHW.
    pub fn reference(&self) -> ArrayD<f32> {
        let spatial = self.kernel_shape.len();
        let geometry: Vec<(usize, usize)> = (0..spatial).map(|axis| self.geometry(axis)).collect();
        let pad_value = self.pad_value();
        let output_shape = self.output_shape();
        let mut output = ArrayD::from_elem(&*output_shape, f32::NEG_INFINITY);
        for coords in indices(&*output_shape) {
            let coords = coords.slice();
            let mut acc = f32::NEG_INFINITY;
            for tap in indices(&*self.kernel_shape) {
                let tap = tap.slice();
                let mut input_coords = coords[0..2].to_vec();
                let mut inside = true;
                for axis in 0..spatial {
                    let pos = (coords[axis + 2] * self.strides[axis] + tap[axis] * self.dilations[axis]) as isize
                        - geometry[axis].1 as isize;
                    if pos < 0 || pos >= self.data.shape()[axis + 2] as isize {
                        inside = false;
                    }
                    input_coords.push(pos.max(0) as usize);
                }
                let value = if inside { Some(self.data[&*input_coords]) } else { pad_value };
                if let Some(value) = value {
                    acc = acc.max(value);
                }
            }
            output[coords] = acc;
        }
        output
    }
}

/// Deterministic positive values.
pub fn iota(shape: &[usize]) -> ArrayD<f32> {
    let len = shape.iter().product::<usize>();
    ArrayD::from_shape_vec(shape, (0..len).map(|x| ((x * 7) % len) as f32 + 1.0).collect()).unwrap()
}
