fn main() {
    noteflow_lib::run()
}
