use std::fmt;

macro_rules! ops {
    ($( $variant:ident => $name:literal )+) => {
        /// 目标 IR 算子码。
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        pub enum Op {
            $( $variant, )+
        }

        impl Op {
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }
        }
    };
}

ops! {
    Unknown              => "Op_UNKNOWN"
    Add                  => "Op_ADD"
    Sub                  => "Op_SUB"
    Mul                  => "Op_MUL"
    Maximum              => "Op_MAXIMUM"
    Minimum              => "Op_MINIMUM"
    Conv2d               => "Op_CONV2D"
    TransposeConv2d      => "Op_TRANSPOSE_CONV2D"
    AvgPool2d            => "Op_AVG_POOL2D"
    MaxPool2d            => "Op_MAX_POOL2D"
    Pad                  => "Op_PAD"
    Reshape              => "Op_RESHAPE"
    Slice                => "Op_SLICE"
    Transpose            => "Op_TRANSPOSE"
    Concat               => "Op_CONCAT"
    Const                => "Op_CONST"
    Cast                 => "Op_CAST"
    Rescale              => "Op_RESCALE"
    Clamp                => "Op_CLAMP"
    ReduceMax            => "Op_REDUCE_MAX"
    ReduceSum            => "Op_REDUCE_SUM"
    Table                => "Op_TABLE"
    LogicalLeftShift     => "Op_LOGICAL_LEFT_SHIFT"
    ArithmeticRightShift => "Op_ARITHMETIC_RIGHT_SHIFT"
    Clz                  => "Op_CLZ"
    GreaterEqual         => "Op_GREATER_EQUAL"
    Select               => "Op_SELECT"
    Gather               => "Op_GATHER"
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
