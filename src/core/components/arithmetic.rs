use super::InputView;

/// sum = A xor B, carry = A and B.
pub(crate) fn half_adder(a: u32, b: u32) -> (u32, u32) {
    let a = a & 1;
    let b = b & 1;
    (a ^ b, a & b)
}

/// One-bit full adder over A, B and carry-in.
pub(crate) fn full_adder(a: u32, b: u32, cin: u32) -> (u32, u32) {
    let total = (a & 1) + (b & 1) + (cin & 1);
    (total % 2, total / 2)
}

/// ALU with explicit Binvert/CarryIn controls. Subtraction is the caller's
/// responsibility via `Binvert = 1, CarryIn = 1`.
pub(crate) fn alu_simple(view: &InputView) -> Result<u32, String> {
    let a = if view.value("Ainvert") == 1 {
        !view.value("input1")
    } else {
        view.value("input1")
    };
    let b = if view.value("Binvert") == 1 {
        !view.value("input2")
    } else {
        view.value("input2")
    };
    match view.value("OP") {
        0 => Ok(a & b),
        1 => Ok(a | b),
        2 => Ok(a.wrapping_add(b).wrapping_add(view.value("CarryIn"))),
        op => Err(format!("invalid ALU operation {}", op)),
    }
}

/// ALU with a Bnegate control that bakes the +1 into the operand, plus a
/// signed set-on-less-than operation and a zero flag.
pub(crate) fn alu_advanced(view: &InputView) -> Result<(u32, u32), String> {
    let a = if view.value("Ainvert") == 1 {
        !view.value("input1")
    } else {
        view.value("input1")
    };
    let b = if view.value("Bnegate") == 1 {
        (!view.value("input2")).wrapping_add(1)
    } else {
        view.value("input2")
    };
    let value = match view.value("OP") {
        0 => a & b,
        1 => a | b,
        2 => a.wrapping_add(b),
        3 => u32::from((a as i32) < (b as i32)),
        op => return Err(format!("invalid ALU operation {}", op)),
    };
    Ok((value, u32::from(value == 0)))
}
