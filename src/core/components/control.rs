/// ALU control decode: `(ainvert, binvert, operation)` from the main
/// control's 2-bit ALUop and the instruction's funct field.
pub(crate) fn alu_control(alu_op: u32, funct: u32) -> (u32, u32, u32) {
    match alu_op {
        1 => (0, 1, 2),
        2 => match funct {
            2 => (0, 1, 2),
            4 => (0, 0, 0),
            5 => (0, 0, 1),
            10 => (0, 1, 3),
            // funct 0 and anything unknown decode as ADD.
            _ => (0, 0, 2),
        },
        // ALUop 0 (lw/sw) and the unused encoding 3.
        _ => (0, 0, 0),
    }
}

/// Main control decode for the supported opcodes; unknown opcodes deassert
/// every line.
pub(crate) fn control_unit(opcode: u32) -> [(&'static str, u32); 8] {
    let (reg_dst, branch, mem_read, mem_to_reg, alu_op, mem_write, alu_src, reg_write) =
        match opcode {
            0 => (1, 0, 0, 0, 2, 0, 0, 1),
            35 => (0, 0, 1, 1, 0, 0, 1, 1),
            43 => (0, 0, 0, 0, 0, 1, 1, 0),
            4 => (0, 1, 0, 0, 1, 0, 0, 0),
            _ => (0, 0, 0, 0, 0, 0, 0, 0),
        };
    [
        ("RegDst", reg_dst),
        ("Branch", branch),
        ("MemRead", mem_read),
        ("MemtoReg", mem_to_reg),
        ("AluOp", alu_op),
        ("MemWrite", mem_write),
        ("AluSrc", alu_src),
        ("RegWrite", reg_write),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alu_control_decode() {
        assert_eq!(alu_control(0, 0), (0, 0, 0));
        assert_eq!(alu_control(1, 0), (0, 1, 2));
        assert_eq!(alu_control(2, 0), (0, 0, 2));
        assert_eq!(alu_control(2, 2), (0, 1, 2));
        assert_eq!(alu_control(2, 4), (0, 0, 0));
        assert_eq!(alu_control(2, 5), (0, 0, 1));
        assert_eq!(alu_control(2, 10), (0, 1, 3));
        // Unknown funct falls back to ADD.
        assert_eq!(alu_control(2, 63), (0, 0, 2));
    }

    #[test]
    fn test_control_unit_decode() {
        let r_type: Vec<u32> = control_unit(0).iter().map(|(_, v)| *v).collect();
        assert_eq!(r_type, vec![1, 0, 0, 0, 2, 0, 0, 1]);

        let lw: Vec<u32> = control_unit(35).iter().map(|(_, v)| *v).collect();
        assert_eq!(lw, vec![0, 0, 1, 1, 0, 0, 1, 1]);

        let sw: Vec<u32> = control_unit(43).iter().map(|(_, v)| *v).collect();
        assert_eq!(sw, vec![0, 0, 0, 0, 0, 1, 1, 0]);

        let beq: Vec<u32> = control_unit(4).iter().map(|(_, v)| *v).collect();
        assert_eq!(beq, vec![0, 1, 0, 0, 1, 0, 0, 0]);

        let unknown: Vec<u32> = control_unit(17).iter().map(|(_, v)| *v).collect();
        assert_eq!(unknown, vec![0; 8]);
    }
}
