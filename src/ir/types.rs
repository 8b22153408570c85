/// Scalar element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I1,
    I8,
    I32,
    I64,
}

impl std::fmt::Display for DType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DType::I1 => "i1",
            DType::I8 => "i8",
            DType::I32 => "i32",
            DType::I64 => "i64",
        };
        f.write_str(s)
    }
}

/// The type of an IR value.
///
/// Pointers are opaque except for function pointers, which keep their
/// signature so indirect calls can be checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Void,
    Scalar(DType),
    /// Opaque data pointer (strings, untyped addresses).
    Ptr,
    /// Pointer to a function with the given signature.
    FnPtr(Box<FnSig>),
}

impl IrType {
    pub fn i32() -> Self {
        IrType::Scalar(DType::I32)
    }

    pub fn i64() -> Self {
        IrType::Scalar(DType::I64)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, IrType::Ptr | IrType::FnPtr(_))
    }
}

impl std::fmt::Display for IrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrType::Void => f.write_str("void"),
            IrType::Scalar(d) => write!(f, "{}", d),
            IrType::Ptr => f.write_str("ptr"),
            IrType::FnPtr(sig) => write!(f, "{}*", sig),
        }
    }
}

/// A function signature: parameter types and return type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnSig {
    pub params: Vec<IrType>,
    pub ret: IrType,
}

impl FnSig {
    pub fn new(params: Vec<IrType>, ret: IrType) -> Self {
        Self { params, ret }
    }
}

impl std::fmt::Display for FnSig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (", self.ret)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", p)?;
        }
        f.write_str(")")
    }
}
