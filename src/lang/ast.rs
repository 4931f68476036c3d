use crate::lang::token::Span;

/// Expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Numeric literal: `42`, `3.14`
    Number(f64, Span),

    /// Variable or constant reference: `x`, `theta`, `pi`
    Ident(String, Span),

    /// Binary operation: `a + b`, `x^2`
    BinOp {
        op: BinOpKind,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },

    /// Unary negation: `-x`
    Neg { operand: Box<Expr>, span: Span },

    /// Function call: `sin(x)`, `log(x)`
    Call {
        name: String,
        name_span: Span,
        args: Vec<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Number(_, s) => *s,
            Expr::Ident(_, s) => *s,
            Expr::BinOp { span, .. } => *span,
            Expr::Neg { span, .. } => *span,
            Expr::Call { span, .. } => *span,
        }
    }

    /// Collect the free identifiers (variables and constants) in order of
    /// first appearance.
    pub fn free_idents(&self) -> Vec<(String, Span)> {
        let mut out: Vec<(String, Span)> = Vec::new();
        self.walk_idents(&mut out);
        out
    }

    fn walk_idents(&self, out: &mut Vec<(String, Span)>) {
        match self {
            Expr::Number(_, _) => {}
            Expr::Ident(name, span) => {
                if !out.iter().any(|(n, _)| n == name) {
                    out.push((name.clone(), *span));
                }
            }
            Expr::BinOp { lhs, rhs, .. } => {
                lhs.walk_idents(out);
                rhs.walk_idents(out);
            }
            Expr::Neg { operand, .. } => operand.walk_idents(out),
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk_idents(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Mod,
}
