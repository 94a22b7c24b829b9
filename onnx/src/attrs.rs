//! Typed access to node attributes, with errors naming the node, its op
//! type and the attribute.
use crate::errors::OnnxError;
use crate::graph::{Attribute, AttributeType, OnnxNode};
use tfbridge_core::internal::*;

use std::fmt::Debug;

pub trait Reason {
    fn reason(&self) -> Cow<'_, str>;
}

impl Reason for &str {
    fn reason(&self) -> Cow<'_, str> {
        (*self).into()
    }
}

impl<F> Reason for F
where
    F: Fn() -> String,
{
    fn reason(&self) -> Cow<'_, str> {
        self().into()
    }
}

pub trait OptionExt {
    type Item;

    fn and_try<F, T>(self, f: F) -> TfResult<Option<T>>
    where
        F: Fn(Self::Item) -> TfResult<T>;

    fn and_ok<F, T>(self, f: F) -> TfResult<Option<T>>
    where
        F: Fn(Self::Item) -> T;
}

impl<A> OptionExt for Option<A> {
    type Item = A;

    fn and_try<F, T>(self, f: F) -> TfResult<Option<T>>
    where
        F: Fn(Self::Item) -> TfResult<T>,
    {
        match self {
            Some(attr) => f(attr).map(Some),
            None => Ok(None),
        }
    }

    fn and_ok<F, T>(self, f: F) -> TfResult<Option<T>>
    where
        F: Fn(Self::Item) -> T,
    {
        Ok(self.map(f))
    }
}

pub trait AttrScalarType<'a>: 'a + Sized {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>>;
}

impl<'a> AttrScalarType<'a> for &'a str {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        Ok(match node.get_attr_opt_with_type(name, AttributeType::String)? {
            Some(Attribute::String(s)) => Some(s.as_str()),
            _ => None,
        })
    }
}

impl<'a> AttrScalarType<'a> for String {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        let string: Option<&'a str> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        string.and_ok(Into::into)
    }
}

impl<'a> AttrScalarType<'a> for i64 {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        Ok(match node.get_attr_opt_with_type(name, AttributeType::Int)? {
            Some(Attribute::Int(i)) => Some(*i),
            _ => None,
        })
    }
}

impl<'a> AttrScalarType<'a> for f32 {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        Ok(match node.get_attr_opt_with_type(name, AttributeType::Float)? {
            Some(Attribute::Float(f)) => Some(*f),
            _ => None,
        })
    }
}

impl<'a> AttrScalarType<'a> for bool {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        let int: Option<i64> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        int.and_try(|int| {
            node.expect_attr(name, int == 0 || int == 1, "boolean (0 or 1)")?;
            Ok(int == 1)
        })
    }
}

impl<'a> AttrScalarType<'a> for usize {
    fn get_attr_opt_scalar(node: &'a OnnxNode, name: &str) -> TfResult<Option<Self>> {
        let int: Option<i64> = AttrScalarType::get_attr_opt_scalar(node, name)?;
        int.and_try(|int| {
            node.expect_attr(name, int >= 0, "non-negative int")?;
            Ok(int as _)
        })
    }
}

pub trait AttrTVecType<'a>: 'a + Sized {
    fn get_attr_opt_tvec(node: &'a OnnxNode, name: &str) -> TfResult<Option<TVec<Self>>>;
}

impl<'a> AttrTVecType<'a> for i64 {
    fn get_attr_opt_tvec(node: &'a OnnxNode, name: &str) -> TfResult<Option<TVec<Self>>> {
        Ok(match node.get_attr_opt_with_type(name, AttributeType::Ints)? {
            Some(Attribute::Ints(ints)) => Some(ints.iter().copied().collect()),
            _ => None,
        })
    }
}

impl<'a> AttrTVecType<'a> for usize {
    fn get_attr_opt_tvec(node: &'a OnnxNode, name: &str) -> TfResult<Option<TVec<Self>>> {
        let ints: Option<TVec<i64>> = AttrTVecType::get_attr_opt_tvec(node, name)?;
        ints.and_try(|ints| {
            ints.iter()
                .map(|&int| {
                    node.expect_attr(name, int >= 0, || {
                        format!("list of non-negative ints, got {:?}", ints)
                    })?;
                    Ok(int as usize)
                })
                .collect()
        })
    }
}

impl OnnxNode {
    pub fn bail<T>(&self, msg: &str) -> TfResult<T> {
        bail!("Node {} ({}): {}", self.name, self.op_type, msg)
    }

    pub fn bail_attr<T>(&self, attr: &str, msg: &str) -> TfResult<T> {
        bail!("Node {} ({}), attribute '{}': {}", self.name, self.op_type, attr, msg)
    }

    pub fn expect<R: Reason>(&self, cond: bool, what: R) -> TfResult<()> {
        if !cond { self.bail(&format!("expected {}", what.reason())) } else { Ok(()) }
    }

    pub fn expect_attr<R: Reason>(&self, attr: &str, cond: bool, what: R) -> TfResult<()> {
        if !cond { self.bail_attr(attr, &format!("expected {}", what.reason())) } else { Ok(()) }
    }

    fn missing_attr(&self, attr: &str) -> TfError {
        OnnxError::MissingAttribute { node: self.name.clone(), attribute: attr.to_string() }.into()
    }

    fn get_attr_opt_with_type(&self, name: &str, ty: AttributeType) -> TfResult<Option<&Attribute>> {
        let Some(attr) = self.attribute(name) else { return Ok(None) };
        self.expect_attr(name, attr.attribute_type() == ty, || {
            format!("{}, got {}", ty, attr.attribute_type())
        })?;
        Ok(Some(attr))
    }

    pub fn get_attr_opt<'a, T>(&'a self, name: &str) -> TfResult<Option<T>>
    where
        T: AttrScalarType<'a>,
    {
        T::get_attr_opt_scalar(self, name)
    }

    /// A required attribute. Fails with `OnnxError::MissingAttribute` when absent.
    pub fn get_attr<'a, T>(&'a self, name: &str) -> TfResult<T>
    where
        T: AttrScalarType<'a>,
    {
        self.get_attr_opt(name)?.ok_or_else(|| self.missing_attr(name))
    }

    pub fn check_value<T, V: Debug>(&self, attr: &str, value: Result<T, V>) -> TfResult<T> {
        match value {
            Ok(value) => Ok(value),
            Err(err) => self.bail_attr(attr, &format!("unexpected value: {:?}", err)),
        }
    }

    pub fn get_attr_opt_tvec<'a, T>(&'a self, name: &str) -> TfResult<Option<TVec<T>>>
    where
        T: AttrTVecType<'a>,
    {
        T::get_attr_opt_tvec(self, name)
    }

    /// A required list attribute. Fails with `OnnxError::MissingAttribute` when absent.
    pub fn get_attr_tvec<'a, T>(&'a self, name: &str) -> TfResult<TVec<T>>
    where
        T: AttrTVecType<'a>,
    {
        self.get_attr_opt_tvec(name)?.ok_or_else(|| self.missing_attr(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node() -> OnnxNode {
        OnnxNode::new("pool", "MaxPool")
            .with_attr("kernel_shape", vec![3i64, 3])
            .with_attr("pads", vec![1i64, -1])
            .with_attr("ceil_mode", 2i64)
            .with_attr("auto_pad", "SAME_UPPER")
    }

    #[test]
    fn typed_access() {
        let node = node();
        let kernel: TVec<usize> = node.get_attr_tvec("kernel_shape").unwrap();
        assert_eq!(kernel.as_slice(), &[3, 3]);
        assert_eq!(node.get_attr::<&str>("auto_pad").unwrap(), "SAME_UPPER");
        assert_eq!(node.get_attr_opt::<i64>("strides").unwrap(), None);
    }

    #[test]
    fn missing_is_typed() {
        let err = node().get_attr_tvec::<usize>("strides").unwrap_err();
        assert_eq!(
            err.downcast_ref::<OnnxError>(),
            Some(&OnnxError::MissingAttribute { node: "pool".into(), attribute: "strides".into() })
        );
    }

    #[test]
    fn invalid_values() {
        let node = node();
        assert!(node.get_attr_opt_tvec::<usize>("pads").is_err());
        assert!(node.get_attr_opt::<bool>("ceil_mode").is_err());
        let err = node.get_attr_opt::<i64>("kernel_shape").unwrap_err();
        assert!(err.to_string().contains("attribute 'kernel_shape'"), "{}", err);
    }
}
