mod arbitration;
mod match_phases;
mod teleop_flow;
