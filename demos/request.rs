//! How to query an NTP server for the local clock's delay and offset.

fn main() {
    let host = "time.nist.gov";
    let stats = ntp_probe::request(host).unwrap();
    println!("server: {}", host);
    println!("delay:  {} us", stats.delay.num_microseconds().unwrap());
    println!("offset: {} us", stats.offset.num_microseconds().unwrap());
}
