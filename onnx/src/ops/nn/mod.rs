use crate::model::OnnxOpRegister;

pub mod max_pool;

pub fn register_all_ops(reg: &mut OnnxOpRegister) {
    reg.insert("MaxPool", max_pool::max_pool);
}
