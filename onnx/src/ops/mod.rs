use crate::model::OnnxOpRegister;

pub mod nn;

pub fn register_all_ops(reg: &mut OnnxOpRegister) {
    nn::register_all_ops(reg);
}
