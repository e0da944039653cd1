//! Element-wise math on a raster or a number.

use crate::{
    operation::{ParameterInfo, ParameterKind, Preparation},
    Context, Operation, OperationError, OperationExpression, OperationMetadata, Output,
    PrepareState,
};
use log::info;
use raster::{is_undef, run_partitioned, Domain, Raster, Resolver, UNDEF};
use std::{str::FromStr, sync::Arc};

const NAME: &str = "unarymath";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Asin,
    Acos,
    Atan,
    Log10,
    Ln,
    Abs,
    Ceil,
    Floor,
    Cosh,
    Exp,
    Neg,
    Rnd,
    Sgn,
    Sinh,
    Tanh,
}

impl UnaryOp {
    pub const ALL: [Self; 19] = [
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Sqrt,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Log10,
        Self::Ln,
        Self::Abs,
        Self::Ceil,
        Self::Floor,
        Self::Cosh,
        Self::Exp,
        Self::Neg,
        Self::Rnd,
        Self::Sgn,
        Self::Sinh,
        Self::Tanh,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Sqrt => "sqrt",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Log10 => "log10",
            Self::Ln => "ln",
            Self::Abs => "abs",
            Self::Ceil => "ceil",
            Self::Floor => "floor",
            Self::Cosh => "cosh",
            Self::Exp => "exp",
            Self::Neg => "neg",
            Self::Rnd => "rnd",
            Self::Sgn => "sgn",
            Self::Sinh => "sinh",
            Self::Tanh => "tanh",
        }
    }

    /// Applies this op. Undefined input, and any result that is not a
    /// finite number, yields [UNDEF].
    pub fn apply(self, v: f64) -> f64 {
        if is_undef(v) {
            return UNDEF;
        }
        let r = match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Sqrt => v.sqrt(),
            Self::Asin => v.asin(),
            Self::Acos => v.acos(),
            Self::Atan => v.atan(),
            Self::Log10 => v.log10(),
            Self::Ln => v.ln(),
            Self::Abs => v.abs(),
            Self::Ceil => v.ceil(),
            Self::Floor => v.floor(),
            Self::Cosh => v.cosh(),
            Self::Exp => v.exp(),
            Self::Neg => -v,
            Self::Rnd => v.round(),
            Self::Sgn => {
                if v > 0.0 {
                    1.0
                } else if v < 0.0 {
                    -1.0
                } else {
                    0.0
                }
            }
            Self::Sinh => v.sinh(),
            Self::Tanh => v.tanh(),
        };
        if r.is_finite() {
            r
        } else {
            UNDEF
        }
    }
}

impl FromStr for UnaryOp {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, ()> {
        Self::ALL
            .into_iter()
            .find(|op| op.name().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// `unarymath(<op>, <raster|number>)`
#[derive(Debug)]
pub struct UnaryMath {
    expression: OperationExpression,
    preparation: Preparation<Prepared>,
}

#[derive(Debug)]
enum Prepared {
    Number(UnaryOp, f64),
    Raster {
        op: UnaryOp,
        source: Arc<Raster>,
        output: Raster,
    },
}

impl UnaryMath {
    pub fn new(expression: OperationExpression) -> Self {
        Self {
            expression,
            preparation: Preparation::new(),
        }
    }

    pub fn metadata() -> OperationMetadata {
        OperationMetadata {
            id: "operations/unarymath",
            name: NAME,
            syntax: "unarymath(sin|cos|tan|sqrt|asin|acos|atan|log10|ln|abs|ceil|floor|cosh|exp|neg|rnd|sgn|sinh|tanh,gridcoverage|number)",
            inputs: vec![
                ParameterInfo::new(ParameterKind::Text, "operator", "the function applied to every value"),
                ParameterInfo::new(
                    ParameterKind::Raster,
                    "operand",
                    "input gridcoverage with a numeric domain, or a number",
                ),
            ],
            outputs: vec![ParameterInfo::new(
                ParameterKind::Raster,
                "result",
                "gridcoverage with a value domain, or a number",
            )],
        }
    }

    fn validate(
        expression: &OperationExpression,
        resolver: &dyn Resolver,
    ) -> Result<Prepared, OperationError> {
        let (Some(op), Some(operand), 2) = (
            expression.parameter(0),
            expression.parameter(1),
            expression.parameter_count(),
        ) else {
            return Err(OperationError::IllegalParameterCount {
                operation: NAME,
                expected: 2,
                found: expression.parameter_count(),
            });
        };
        let op: UnaryOp = op.parse().map_err(|()| OperationError::IllegalParameter {
            operation: NAME,
            parameter: "operator",
            value: op.to_owned(),
        })?;

        if let Ok(number) = operand.parse::<f64>() {
            return Ok(Prepared::Number(op, number));
        }
        let source = resolver
            .raster(operand)
            .map_err(OperationError::could_not_load(operand))?;
        let output_name = expression.output_or(operand);
        let output = Raster::new(
            output_name.as_str(),
            Arc::clone(source.georeference()),
            Domain::Value,
            source.size().zsize,
        )
        .map_err(OperationError::not_initialized(&output_name))?;
        Ok(Prepared::Raster { op, source, output })
    }
}

impl Operation for UnaryMath {
    fn metadata(&self) -> OperationMetadata {
        Self::metadata()
    }

    fn state(&self) -> PrepareState {
        self.preparation.state()
    }

    fn prepare(&mut self, _ctx: &Context, resolver: &dyn Resolver) -> Result<(), OperationError> {
        let expression = &self.expression;
        self.preparation
            .prepare(NAME, || Self::validate(expression, resolver))
    }

    fn execute(
        &mut self,
        ctx: &Context,
        resolver: &dyn Resolver,
    ) -> Result<Output, OperationError> {
        if self.preparation.state() == PrepareState::NotPrepared {
            self.prepare(ctx, resolver)?;
        }
        let (op, source, mut output) = match self.preparation.take(NAME)? {
            Prepared::Number(op, v) => return Ok(Output::Number(op.apply(v))),
            Prepared::Raster { op, source, output } => (op, source, output),
        };

        let bounds = output.cells();
        let samples = output
            .samples_mut()
            .map_err(OperationError::execution_failed(NAME))?;
        run_partitioned(
            ctx.mode(),
            bounds,
            ctx.partition_count(),
            samples,
            ctx.cancel_flag(),
            |bx, slice| {
                for (v, dst) in bx.iter().zip(slice.iter_mut()) {
                    *dst = op.apply(source.value(v));
                }
                Ok(())
            },
        )
        .map_err(OperationError::execution_failed(NAME))?;

        info!("{NAME}: {}({}) -> {}", op.name(), source.name(), output.name());
        Ok(Output::Raster(output))
    }
}

#[cfg(test)]
mod tests {
    use super::{UnaryMath, UnaryOp};
    use crate::{
        fixtures::{catalog, output_values},
        Context, Operation, OperationExpression,
    };
    use approx::assert_relative_eq;
    use raster::{Domain, Resolver, UNDEF};

    fn unarymath(op: &str, operand: &str) -> UnaryMath {
        UnaryMath::new(OperationExpression::new("unarymath", [op, operand]))
    }

    #[test]
    fn test_apply() {
        assert_eq!(UnaryOp::Sqrt.apply(16.0), 4.0);
        assert_eq!(UnaryOp::Sgn.apply(0.0), 0.0);
        assert_eq!(UnaryOp::Sgn.apply(-3.0), -1.0);
        assert_eq!(UnaryOp::Rnd.apply(2.5), 3.0);
        assert_eq!(UnaryOp::Neg.apply(2.0), -2.0);
        assert_relative_eq!(UnaryOp::Ln.apply(std::f64::consts::E), 1.0);
        assert_eq!(UnaryOp::Ln.apply(-1.0), UNDEF);
        assert_eq!(UnaryOp::Log10.apply(0.0), UNDEF);
        assert_eq!(UnaryOp::Exp.apply(1e6), UNDEF);
        assert_eq!(UnaryOp::Abs.apply(UNDEF), UNDEF);
    }

    #[test]
    fn test_parse_op() {
        assert_eq!("LOG10".parse::<UnaryOp>(), Ok(UnaryOp::Log10));
        for op in UnaryOp::ALL {
            assert_eq!(op.name().parse::<UnaryOp>(), Ok(op));
        }
        assert!("cbrt".parse::<UnaryOp>().is_err());
    }

    #[test]
    fn test_number_operand() {
        let catalog = catalog();
        let out = unarymath("sqrt", "16").execute(&Context::new(), &catalog).unwrap();
        assert_eq!(out.as_number(), Some(4.0));
    }

    #[test]
    fn test_raster_operand() {
        let catalog = catalog();
        let out = unarymath("neg", "mask")
            .execute(&Context::new(), &catalog)
            .unwrap()
            .into_raster()
            .unwrap();
        assert_eq!(out.domain(), Domain::Value);
        assert_eq!(out.iter().collect::<Vec<_>>(), vec![-1.0, UNDEF, -3.0]);

        let values = output_values(unarymath("abs", "src").execute(&Context::new(), &catalog));
        let src = catalog.raster("src").unwrap();
        assert_eq!(values, src.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_parameter_errors() {
        let catalog = catalog();
        let ctx = Context::new();
        assert_eq!(
            unarymath("cbrt", "8").prepare(&ctx, &catalog).unwrap_err().code(),
            "illegal parameter"
        );
        assert_eq!(
            unarymath("sin", "ghost").prepare(&ctx, &catalog).unwrap_err().code(),
            "could not load"
        );
        let mut op = UnaryMath::new(OperationExpression::new("unarymath", ["sin"]));
        assert_eq!(
            op.prepare(&ctx, &catalog).unwrap_err().code(),
            "illegal parameter count"
        );
    }
}
