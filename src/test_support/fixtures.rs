//! Canned tool output for tests.

/// `verilator --version` output.
pub const VERILATOR_VERSION: &str = "Verilator 4.028 2020-01-01 rev v4.026-92-g890cecc1\n";

/// Verilator lint output for a file with one warning and one error.
pub const VERILATOR_OUTPUT: &str = "\
%Warning-UNUSED: top.sv:10:8: Signal is not used: 'dbg'
                : ... In instance top
%Error: top.sv:42: syntax error, unexpected IDENTIFIER
  expecting ';'
%Error: Exiting due to 1 error(s)
";

/// `ghdl --version` output.
pub const GHDL_VERSION: &str = "\
GHDL 3.0.0 (Ubuntu 3.0.0+dfsg-1) [Dunoon edition]
 Compiled with GNAT Version: 12.2.0
 mcode code generator
";

/// GHDL analysis output for a file with one warning and one error.
pub const GHDL_OUTPUT: &str = "\
top.vhd:12:3:warning: signal \"unused_sig\" is never read
top.vhd:20:14: no declaration for \"clk_i\"
ghdl: compilation error
";
