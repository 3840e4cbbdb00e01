//! Einstein summation over any number of operands.

use crate::Scalar;
use crate::error::{CoreError, Result};
use crate::tensor::{Tensor, advance};

/// One axis label: a named subscript or the `i`-th broadcast axis covered by
/// `...`, counted from the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Label {
    Broadcast(usize),
    Named(char),
}

/// Subscripts of one operand split around an optional ellipsis.
#[derive(Debug, Default)]
struct Term {
    before: Vec<char>,
    after: Vec<char>,
    ellipsis: bool,
}

impl Term {
    fn parse(s: &str) -> Result<Self> {
        let mut term = Term::default();
        let mut rest = s;
        while let Some(c) = rest.chars().next() {
            if rest.starts_with("...") {
                if term.ellipsis {
                    return Err(CoreError::invalid_argument(format!(
                        "einsum term '{s}' has more than one ellipsis"
                    )));
                }
                term.ellipsis = true;
                rest = &rest[3..];
                continue;
            }
            if !c.is_ascii_alphabetic() {
                return Err(CoreError::invalid_argument(format!(
                    "invalid einsum subscript '{c}'"
                )));
            }
            if term.ellipsis {
                term.after.push(c);
            } else {
                term.before.push(c);
            }
            rest = &rest[c.len_utf8()..];
        }
        Ok(term)
    }

    fn named(&self) -> usize {
        self.before.len() + self.after.len()
    }

    /// Labels for an operand of rank `ndim`.
    fn expand(&self, ndim: usize) -> Result<Vec<Label>> {
        let named = self.named();
        if (!self.ellipsis && ndim != named) || ndim < named {
            return Err(CoreError::invalid_argument(format!(
                "einsum subscripts name {named} axes for a {ndim}-D operand"
            )));
        }
        let n_ell = ndim - named;
        let mut labels: Vec<Label> = self.before.iter().map(|&c| Label::Named(c)).collect();
        labels.extend((0..n_ell).rev().map(Label::Broadcast));
        labels.extend(self.after.iter().map(|&c| Label::Named(c)));
        Ok(labels)
    }
}

/// Evaluate an Einstein summation such as `"ij,jk->ik"`.
///
/// Without `->` the output holds the broadcast axes followed by every label
/// that appears exactly once, in alphabetical order. A label repeated inside
/// one operand selects its diagonal. Axes of size 1 broadcast.
///
/// ```
/// # use torchbridge_core::tensor::Tensor;
/// # use torchbridge_core::linalg::einsum;
/// let a = Tensor::from_vec(vec![1, 2, 3, 4], vec![2, 2]).unwrap();
/// let b = Tensor::from_vec(vec![5, 6, 7, 8], vec![2, 2]).unwrap();
/// let c = einsum("ij,jk->ik", &[&a, &b]).unwrap();
/// assert_eq!(c.as_slice(), &[19, 22, 43, 50]);
/// assert_eq!(einsum("ii", &[&a]).unwrap().as_slice(), &[5]);
/// ```
pub fn einsum<T: Scalar>(equation: &str, operands: &[&Tensor<T>]) -> Result<Tensor<T>> {
    let equation: String = equation.chars().filter(|c| !c.is_whitespace()).collect();
    let (lhs, rhs) = match equation.split_once("->") {
        Some((l, r)) => (l, Some(r)),
        None => (equation.as_str(), None),
    };
    let terms = lhs.split(',').map(Term::parse).collect::<Result<Vec<_>>>()?;
    if terms.len() != operands.len() {
        return Err(CoreError::invalid_argument(format!(
            "einsum equation has {} operands, got {}",
            terms.len(),
            operands.len()
        )));
    }

    // Resolve each operand's labels and every label's extent.
    let mut sizes: Vec<(Label, usize)> = Vec::new();
    let mut operand_labels = Vec::with_capacity(operands.len());
    let mut n_broadcast = 0;
    for (term, op) in terms.iter().zip(operands) {
        let labels = term.expand(op.ndim())?;
        n_broadcast = n_broadcast.max(op.ndim() - term.named());
        for (&label, &dim) in labels.iter().zip(op.shape()) {
            match sizes.iter_mut().find(|(l, _)| *l == label) {
                Some((_, size)) if *size == dim || dim == 1 => {}
                Some((_, size)) if *size == 1 => *size = dim,
                Some((_, size)) => {
                    return Err(CoreError::invalid_argument(format!(
                        "einsum label {label:?} has conflicting sizes {size} and {dim}"
                    )));
                }
                None => sizes.push((label, dim)),
            }
        }
        operand_labels.push(labels);
    }

    let output: Vec<Label> = match rhs {
        Some(r) => {
            let term = Term::parse(r)?;
            let labels = term.expand(term.named() + if term.ellipsis { n_broadcast } else { 0 })?;
            for (i, l) in labels.iter().enumerate() {
                if labels[..i].contains(l) {
                    return Err(CoreError::invalid_argument(format!(
                        "einsum output repeats label {l:?}"
                    )));
                }
                if !sizes.iter().any(|(s, _)| s == l) {
                    return Err(CoreError::invalid_argument(format!(
                        "einsum output label {l:?} does not appear in any operand"
                    )));
                }
            }
            labels
        }
        None => {
            let mut out: Vec<Label> = (0..n_broadcast).rev().map(Label::Broadcast).collect();
            let mut once: Vec<Label> = sizes
                .iter()
                .map(|&(l, _)| l)
                .filter(|l| matches!(l, Label::Named(_)))
                .filter(|l| operand_labels.iter().flatten().filter(|x| *x == l).count() == 1)
                .collect();
            once.sort_unstable();
            out.extend(once);
            out
        }
    };

    // Iterate over output labels first, then the contracted ones.
    let mut order = output.clone();
    order.extend(sizes.iter().map(|&(l, _)| l).filter(|l| !output.contains(l)));
    let extents: Vec<usize> = order
        .iter()
        .map(|l| sizes.iter().find(|(s, _)| s == l).map_or(1, |&(_, n)| n))
        .collect();
    let out_shape: Vec<usize> = extents[..output.len()].to_vec();
    let out_numel: usize = out_shape.iter().product();
    let reduce_numel: usize = extents[output.len()..].iter().product();

    // Per operand: (position in `order`, stride) for every axis; broadcast axes get stride 0.
    let plans: Vec<Vec<(usize, usize)>> = operand_labels
        .iter()
        .zip(operands)
        .map(|(labels, op)| {
            labels
                .iter()
                .enumerate()
                .map(|(axis, l)| {
                    let pos = order.iter().position(|o| o == l).unwrap_or(0);
                    let stride = if op.shape()[axis] == 1 { 0 } else { op.strides()[axis] };
                    (pos, stride)
                })
                .collect()
        })
        .collect();

    let mut data = vec![T::zero(); out_numel];
    let mut index = vec![0usize; order.len()];
    for slot in data.iter_mut() {
        let mut acc = T::zero();
        for _ in 0..reduce_numel {
            let mut term = T::one();
            for (plan, op) in plans.iter().zip(operands) {
                let flat: usize = plan.iter().map(|&(pos, stride)| index[pos] * stride).sum();
                term *= op.as_slice()[flat];
            }
            acc += term;
            advance(&mut index, &extents);
        }
        *slot = acc;
        if reduce_numel == 0 {
            advance(&mut index[..output.len()], &out_shape);
        }
    }
    Tensor::from_vec(data, out_shape)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(data: Vec<i64>, shape: Vec<usize>) -> Tensor<i64> {
        Tensor::from_vec(data, shape).unwrap()
    }

    #[test]
    fn test_matmul_and_transpose() {
        let a = t(vec![1, 2, 3, 4, 5, 6], vec![2, 3]);
        let b = t(vec![1, 0, 0, 1, 1, 1], vec![3, 2]);
        let c = einsum("ij,jk->ik", &[&a, &b]).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.as_slice(), &[4, 5, 10, 11]);
        let at = einsum("ij->ji", &[&a]).unwrap();
        assert_eq!(at.as_slice(), &[1, 4, 2, 5, 3, 6]);
    }

    #[test]
    fn test_implicit_output_sorted() {
        let a = t(vec![1, 2, 3, 4, 5, 6], vec![2, 3]);
        // "ba" keeps both labels, sorted: output is a transpose.
        let out = einsum("ba", &[&a]).unwrap();
        assert_eq!(out.shape(), &[3, 2]);
        let sum = einsum("ij->", &[&a]).unwrap();
        assert_eq!(sum.shape(), &[] as &[usize]);
        assert_eq!(sum.as_slice(), &[21]);
    }

    #[test]
    fn test_diagonal_and_outer() {
        let a = t(vec![1, 2, 3, 4], vec![2, 2]);
        assert_eq!(einsum("ii->i", &[&a]).unwrap().as_slice(), &[1, 4]);
        let x = t(vec![1, 2], vec![2]);
        let y = t(vec![3, 4, 5], vec![3]);
        let outer = einsum("i,j->ij", &[&x, &y]).unwrap();
        assert_eq!(outer.as_slice(), &[3, 4, 5, 6, 8, 10]);
    }

    #[test]
    fn test_ellipsis_batch() {
        let a = Tensor::<i64>::arange(12).reshape(vec![3, 2, 2]).unwrap();
        let tr = einsum("...ii->...", &[&a]).unwrap();
        assert_eq!(tr.as_slice(), &[3, 11, 19]);
    }

    #[test]
    fn test_errors() {
        let a = t(vec![1, 2, 3, 4], vec![2, 2]);
        assert!(einsum("ij,jk->ik", &[&a]).is_err());
        assert!(einsum("ijk", &[&a]).is_err());
        assert!(einsum("ij->ii", &[&a]).is_err());
        assert!(einsum("ij->k", &[&a]).is_err());
        assert!(einsum("i1", &[&a]).is_err());
        let b = t(vec![1, 2, 3], vec![3]);
        assert!(einsum("i,i->i", &[&t(vec![1, 2], vec![2]), &b]).is_err());
    }
}
