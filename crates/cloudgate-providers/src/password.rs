//! Server-side password generation and the boot scripts that apply a
//! password to a freshly created instance.

use rand::{distributions::Alphanumeric, Rng};

pub const GENERATED_LENGTH: usize = 16;

pub fn generate() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_LENGTH)
        .map(char::from)
        .collect()
}

/// Cloud-init user data that sets the password for the stock EC2 users and
/// turns SSH password authentication on.
pub fn aws_user_data(password: &str) -> String {
    format!(
        r#"#!/bin/bash
set -e
if id -u ubuntu >/dev/null 2>&1; then
  echo "ubuntu:{password}" | chpasswd
else
  useradd -m -s /bin/bash ubuntu || true
  echo "ubuntu:{password}" | chpasswd
fi
if id -u ec2-user >/dev/null 2>&1; then
  echo "ec2-user:{password}" | chpasswd
fi
sed -i 's/^#PasswordAuthentication no/PasswordAuthentication yes/' /etc/ssh/sshd_config || true
sed -i 's/^PasswordAuthentication no/PasswordAuthentication yes/' /etc/ssh/sshd_config || true
systemctl restart sshd || service ssh restart || true
"#
    )
}

/// Startup script for the Debian boot image used on GCP.
pub fn gcp_startup_script(password: &str) -> String {
    format!(
        r#"#!/bin/bash
set -e
if ! id -u debian >/dev/null 2>&1; then
  useradd -m -s /bin/bash debian || true
fi
echo "debian:{password}" | chpasswd
sed -i 's/^#PasswordAuthentication no/PasswordAuthentication yes/' /etc/ssh/sshd_config || true
sed -i 's/^PasswordAuthentication no/PasswordAuthentication yes/' /etc/ssh/sshd_config || true
systemctl restart sshd || service ssh restart || true
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_passwords_are_alphanumeric() {
        let password = generate();
        assert_eq!(password.len(), GENERATED_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn consecutive_passwords_differ() {
        assert_ne!(generate(), generate());
    }

    #[test]
    fn scripts_apply_the_password() {
        let user_data = aws_user_data("pw123");
        assert!(user_data.contains("ubuntu:pw123"));
        assert!(user_data.contains("ec2-user:pw123"));
        assert!(user_data.contains("chpasswd"));

        let startup = gcp_startup_script("pw123");
        assert!(startup.contains("debian:pw123"));
        assert!(startup.contains("PasswordAuthentication yes"));
    }
}
